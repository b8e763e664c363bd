//! Set encode and decode.
//!
//! Encode writes the fields in schema order. Decode accepts them in any order: each tag is
//! looked up in the schema's tag table and the value is appended to the matching field.
//! Minimum arities are checked once the region is exhausted. In a header set every element
//! starts with a length covering the whole element, followed by its tag.

use crate::{
    codec::Message,
    config::Policy,
    context::{DecodeContext, EncodeContext},
    field::Counter,
    frame,
    schema::Schema,
    Error,
};
use tracing::{debug, trace};

pub(crate) fn write<'a, M: Message<'a>>(
    message: &M,
    schema: &Schema,
    ctx: &mut EncodeContext<'_>,
) -> Result<(), Error> {
    for (index, field) in schema.fields().iter().enumerate() {
        let slot = message.field(index);
        let count = slot.count();
        trace!(field = field.name(), offset = ctx.offset(), count, "encode field");
        frame::check_missing(field, count, ctx.offset())?;
        frame::check_excess(field, count, ctx.offset())?;
        frame::write_field(ctx, field, slot)?;
    }
    Ok(())
}

pub(crate) fn read<'a, M: Message<'a>>(
    message: &mut M,
    schema: &Schema,
    ctx: &mut DecodeContext<'a>,
) -> Result<(), Error> {
    if let Some(width) = schema.tag_width() {
        while !ctx.is_empty() {
            let offset = ctx.offset();
            ctx.set_field(schema.name());
            let header = match schema.header() {
                Some(length) => Some(frame::read_length(ctx, length)?),
                None => None,
            };
            let tag = ctx.get_uint(width)?;
            let Some(index) = schema.lookup(tag) else {
                skip_unknown(schema, ctx, tag, offset, header)?;
                continue;
            };
            let field = &schema.fields()[index];
            trace!(field = field.name(), offset, tag, "decode field");

            let count = message.field(index).count();
            frame::check_excess(field, count + 1, offset)?;
            if let Some(len) = header {
                ctx.set_field(field.name());
                frame::read_body(ctx, message.field_mut(index), offset, len)?;
                continue;
            }
            match field.counter() {
                Some(Counter::Prefix(width)) => {
                    // All values of a counted field follow a single tag
                    if count > 0 {
                        return Err(Error::ExcessField {
                            field: field.name(),
                            expected: count,
                            got: count + 1,
                            offset,
                        });
                    }
                    let count = frame::read_count(ctx, field, width)?;
                    frame::check_excess(field, count, offset)?;
                    let slot = message.field_mut(index);
                    for _ in 0..count {
                        frame::read_value(ctx, field, slot)?;
                    }
                }
                _ => frame::read_value(ctx, field, message.field_mut(index))?,
            }
        }
    }

    for (index, field) in schema.fields().iter().enumerate() {
        frame::check_missing(field, message.field(index).count(), ctx.offset())?;
    }
    Ok(())
}

/// Skips the value of an unknown `tag` whose element starts at `offset`. `header` is the
/// element length already read in a header set.
fn skip_unknown(
    schema: &Schema,
    ctx: &mut DecodeContext<'_>,
    tag: u64,
    offset: usize,
    header: Option<usize>,
) -> Result<(), Error> {
    let unknown = Error::ExtraField {
        container: schema.name(),
        tag,
        offset,
    };
    if ctx.config().unknown_tags == Policy::Reject {
        return Err(unknown);
    }
    if let Some(len) = header {
        debug!(container = schema.name(), tag, offset, "skipping unknown element");
        let Some(rest) = len.checked_sub(ctx.offset() - offset) else {
            return Err(Error::InvalidLength {
                field: schema.name(),
                length: len,
                offset,
            });
        };
        return ctx.take(rest).map(|_| ());
    }
    let Some(length) = schema.skip_length() else {
        return Err(unknown);
    };
    debug!(container = schema.name(), tag, offset, "skipping unknown tag");
    frame::skip_value(ctx, length)
}
