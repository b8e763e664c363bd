//! Sequence encode and decode.
//!
//! Fields are processed once, in declared order, without backtracking. On decode a field
//! consumes values while its framing matches the input: the tag is equal for tagged fields,
//! or input remains for untagged ones. Counter-delegated fields consume exactly the delegated
//! number of values. On encode, a counter field left unset is written with the instance count
//! of the field it counts.

use crate::{
    codec::Message,
    context::{DecodeContext, EncodeContext},
    field::{Counter, Field},
    frame,
    instance::Slot,
    schema::Schema,
    Error,
};
use tracing::trace;

pub(crate) fn len_encoded<'a, M: Message<'a>>(message: &M, schema: &Schema) -> usize {
    schema
        .fields()
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let slot = message.field(index);
            match derived_count(message, schema, index) {
                Some(count) => frame::count_len(field, slot, count),
                None => frame::field_len(field, slot),
            }
        })
        .sum()
}

pub(crate) fn write<'a, M: Message<'a>>(
    message: &M,
    schema: &Schema,
    ctx: &mut EncodeContext<'_>,
) -> Result<(), Error> {
    for (index, field) in schema.fields().iter().enumerate() {
        let slot = message.field(index);
        let count = slot.count();
        trace!(field = field.name(), offset = ctx.offset(), count, "encode field");
        if let Some(derived) = derived_count(message, schema, index) {
            trace!(field = field.name(), derived, "derive counter");
            frame::write_count(ctx, field, slot, derived)?;
            continue;
        }
        frame::check_missing(field, count, ctx.offset())?;
        frame::check_excess(field, count, ctx.offset())?;
        if let Some(Counter::Field(counter)) = field.counter() {
            check_counter(message, schema, counter, count, ctx.offset())?;
        }
        frame::write_field(ctx, field, slot)?;
    }
    Ok(())
}

/// Instance count of the first field counted by the field at `index`, if that field is unset.
///
/// An unset counter is written with this count in place of a value. An optional counter of
/// zero instances stays absent.
fn derived_count<'a, M: Message<'a>>(message: &M, schema: &Schema, index: usize) -> Option<usize> {
    if message.field(index).count() > 0 {
        return None;
    }
    let count = schema
        .fields()
        .iter()
        .enumerate()
        .find_map(|(counted, field)| match field.counter() {
            Some(Counter::Field(counter)) if counter == index => Some(message.field(counted).count()),
            _ => None,
        })?;
    if count == 0 && !schema.fields()[index].arity_info().is_mandatory() {
        return None;
    }
    Some(count)
}

/// Fails if the value of the counter field differs from the actual instance count.
fn check_counter<'a, M: Message<'a>>(
    message: &M,
    schema: &Schema,
    counter: usize,
    count: usize,
    offset: usize,
) -> Result<(), Error> {
    let declared = derived_count(message, schema, counter)
        .or_else(|| message.field(counter).as_count())
        .unwrap_or(0);
    if declared != count {
        return Err(Error::InvalidValue {
            field: schema.fields()[counter].name(),
            value: declared as u64,
            offset,
        });
    }
    Ok(())
}

pub(crate) fn read<'a, M: Message<'a>>(
    message: &mut M,
    schema: &Schema,
    ctx: &mut DecodeContext<'a>,
) -> Result<(), Error> {
    for (index, field) in schema.fields().iter().enumerate() {
        trace!(field = field.name(), offset = ctx.offset(), "decode field");
        let count = match field.counter() {
            Some(Counter::Prefix(width)) => {
                let present = match field.tag_info() {
                    Some(tag) if frame::peek_tag(ctx, tag) => {
                        ctx.take(tag.width().bytes())?;
                        true
                    }
                    Some(_) => false,
                    None => !ctx.is_empty() || field.arity_info().is_mandatory(),
                };
                if present {
                    let count = frame::read_count(ctx, field, width)?;
                    read_counted(ctx, field, message.field_mut(index), count)?
                } else {
                    0
                }
            }
            Some(Counter::Field(counter)) => {
                let count = message.field(counter).as_count().unwrap_or(0);
                read_counted(ctx, field, message.field_mut(index), count)?
            }
            None => read_matching(ctx, field, message.field_mut(index))?,
        };
        frame::check_missing(field, count, ctx.offset())?;
    }
    Ok(())
}

/// Reads exactly `count` values, each preceded by the field's tag if it has one.
fn read_counted<'a>(
    ctx: &mut DecodeContext<'a>,
    field: &Field,
    slot: &mut dyn Slot<'a>,
    count: usize,
) -> Result<usize, Error> {
    frame::check_excess(field, count, ctx.offset())?;
    let prefixed = matches!(field.counter(), Some(Counter::Prefix(_)));
    for got in 0..count {
        if prefixed {
            frame::read_value(ctx, field, slot)?;
            continue;
        }
        if field.tag_info().is_some() && !frame::matches(ctx, field) {
            return Err(Error::MissingField {
                field: field.name(),
                expected: count,
                got,
                offset: ctx.offset(),
            });
        }
        frame::read_instance(ctx, field, slot)?;
    }
    Ok(count)
}

/// Reads values while the input matches the field's framing, up to its maximum arity.
fn read_matching<'a>(
    ctx: &mut DecodeContext<'a>,
    field: &Field,
    slot: &mut dyn Slot<'a>,
) -> Result<usize, Error> {
    let max = field.arity_info().max();
    let mut count = 0;
    while count < max && frame::matches(ctx, field) {
        frame::read_instance(ctx, field, slot)?;
        count += 1;
    }
    if field.arity_info().is_multi() && field.tag_info().is_some() && frame::matches(ctx, field) {
        return Err(Error::ExcessField {
            field: field.name(),
            expected: max,
            got: max + 1,
            offset: ctx.offset(),
        });
    }
    Ok(count)
}
