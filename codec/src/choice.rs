//! Choice encode and decode, used by [crate::impl_choice].
//!
//! A choice is laid out as `[discriminant][alternative]`, the discriminant being the tag of
//! the active alternative in the width declared by the [crate::ChoiceSchema].

use crate::{
    codec::{Choice, Codec},
    context::{DecodeContext, EncodeContext},
    Error,
};
use tracing::trace;

pub fn len_encoded<'a, C: Choice<'a>>(choice: &C) -> usize {
    match choice.selected() {
        Some((_, value)) => C::schema().width().bytes() + value.len_encoded(),
        None => 0,
    }
}

pub fn write<'a, C: Choice<'a>>(choice: &C, ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
    let schema = C::schema();
    let Some((tag, value)) = choice.selected() else {
        return Err(Error::MissingSelection {
            choice: schema.name(),
            offset: ctx.offset(),
        });
    };
    if schema.lookup(tag).is_none() {
        return Err(Error::UnknownMessage {
            choice: schema.name(),
            tag,
            offset: ctx.offset(),
        });
    }
    trace!(choice = schema.name(), tag, offset = ctx.offset(), "encode choice");
    ctx.set_field(schema.name());
    ctx.put_uint(tag, schema.width())?;
    value.write(ctx)
}

/// Activates the alternative identified by `tag`, reporting `offset` if there is none.
pub fn select<'a, 'c, C: Choice<'a>>(
    choice: &'c mut C,
    tag: u64,
    offset: usize,
) -> Result<&'c mut dyn Codec<'a>, Error> {
    let schema = C::schema();
    let unknown = Error::UnknownMessage {
        choice: schema.name(),
        tag,
        offset,
    };
    let Some(alternative) = schema.lookup(tag) else {
        return Err(unknown);
    };
    trace!(
        choice = schema.name(),
        alternative = alternative.name(),
        offset,
        "select alternative"
    );
    choice.activate(tag).ok_or(unknown)
}

/// Reads the discriminant, activates the matching alternative and decodes it.
pub fn read<'a, C: Choice<'a>>(choice: &mut C, ctx: &mut DecodeContext<'a>) -> Result<(), Error> {
    let offset = ctx.offset();
    ctx.set_field(C::schema().name());
    let tag = ctx.get_uint(C::schema().width())?;
    select(choice, tag, offset)?.read(ctx)
}
