//! Container entry points used by [crate::impl_message].

use crate::{
    codec::Message,
    context::{DecodeContext, EncodeContext},
    frame,
    schema::Layout,
    sequence, set, Error,
};

pub fn len_encoded<'a, M: Message<'a>>(message: &M) -> usize {
    let schema = M::schema();
    match schema.layout() {
        Layout::Sequence => sequence::len_encoded(message, schema),
        Layout::Set => schema
            .fields()
            .iter()
            .enumerate()
            .map(|(index, field)| frame::field_len(field, message.field(index)))
            .sum(),
    }
}

pub fn write<'a, M: Message<'a>>(message: &M, ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
    let schema = M::schema();
    match schema.layout() {
        Layout::Sequence => sequence::write(message, schema, ctx),
        Layout::Set => set::write(message, schema, ctx),
    }
}

/// Clears every field of `message`, then decodes it from the current region of `ctx`.
pub fn read<'a, M: Message<'a>>(message: &mut M, ctx: &mut DecodeContext<'a>) -> Result<(), Error> {
    let schema = M::schema();
    for index in 0..schema.fields().len() {
        message.field_mut(index).clear();
    }
    ctx.set_field(schema.name());
    match schema.layout() {
        Layout::Sequence => sequence::read(message, schema, ctx),
        Layout::Set => set::read(message, schema, ctx),
    }
}
