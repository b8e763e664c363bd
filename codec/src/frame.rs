//! Per-value framing: tags, length prefixes and instance counters.
//!
//! One instance of a field is laid out as `[tag?][length?][value]`, or `[length][tag][value]`
//! for a [Field::header] field whose length counts the whole element. A field with a
//! [Counter::Prefix] writes its tag and the instance count once, followed by the values:
//! `[tag?][count][[length?][value]]*`.

use crate::{
    codec::Codec,
    context::{DecodeContext, EncodeContext},
    field::{Counter, Field, Length, Tag, Width},
    instance::Slot,
    Error,
};

/// Largest number of octets in a BER long-form length.
const MAX_BER_OCTETS: usize = core::mem::size_of::<usize>();

/// Number of octets needed to encode `len` with `length`.
pub fn length_len(length: Length, len: usize) -> usize {
    match length {
        Length::Fixed(width) => width.bytes(),
        Length::Ber if len < 0x80 => 1,
        Length::Ber => 1 + octets(len),
    }
}

/// Minimal number of big-endian octets holding `value`.
fn octets(value: usize) -> usize {
    (usize::BITS - value.leading_zeros()).div_ceil(8) as usize
}

/// Writes a length prefix.
pub fn write_length(ctx: &mut EncodeContext<'_>, length: Length, len: usize) -> Result<(), Error> {
    match length {
        Length::Fixed(width) => {
            if len as u64 > width.max_value() {
                return Err(Error::InvalidLength {
                    field: ctx.field(),
                    length: len,
                    offset: ctx.offset(),
                });
            }
            ctx.put_uint(len as u64, width)
        }
        Length::Ber if len < 0x80 => ctx.put_uint(len as u64, Width::U8),
        Length::Ber => {
            let n = octets(len);
            ctx.put_uint(0x80 | n as u64, Width::U8)?;
            ctx.put_uint(len as u64, Width::new(n as u8))
        }
    }
}

/// Reads a length prefix.
pub fn read_length(ctx: &mut DecodeContext<'_>, length: Length) -> Result<usize, Error> {
    let offset = ctx.offset();
    let invalid = |ctx: &DecodeContext<'_>, length: usize| Error::InvalidLength {
        field: ctx.field(),
        length,
        offset,
    };
    let len = match length {
        Length::Fixed(width) => ctx.get_uint(width)?,
        Length::Ber => {
            let first = ctx.get_uint(Width::U8)? as usize;
            if first < 0x80 {
                return Ok(first);
            }
            // 0x80 is the indefinite form
            let n = first & 0x7F;
            if n == 0 || n > MAX_BER_OCTETS {
                return Err(invalid(ctx, first));
            }
            ctx.get_uint(Width::new(n as u8))?
        }
    };
    usize::try_from(len).map_err(|_| invalid(ctx, usize::MAX))
}

pub fn write_tag(ctx: &mut EncodeContext<'_>, tag: Tag) -> Result<(), Error> {
    ctx.put_uint(tag.value(), tag.width())
}

/// Returns true if the next bytes of `ctx` hold `tag`.
pub fn peek_tag(ctx: &DecodeContext<'_>, tag: Tag) -> bool {
    ctx.peek_uint(tag.width()) == Some(tag.value())
}

/// Returns true if the next instance in `ctx` belongs to `field`: its tag matches, or for an
/// untagged field, input remains.
pub fn matches(ctx: &DecodeContext<'_>, field: &Field) -> bool {
    let Some(tag) = field.tag_info() else {
        return !ctx.is_empty();
    };
    let skip = match field.length_info() {
        Some(length) if field.is_header() => length_len(length, 0),
        _ => 0,
    };
    ctx.peek_uint_at(skip, tag.width()) == Some(tag.value())
}

/// Octets of the `[length][tag]` header of a [Field::header] field.
fn header_len(field: &Field) -> usize {
    let length = field.length_info().map_or(0, |length| length_len(length, 0));
    let tag = field.tag_info().map_or(0, |tag| tag.width().bytes());
    length + tag
}

/// Encoded length of one instance without its tag: `[length?][value]`.
pub fn value_len<'a>(field: &Field, value: &dyn Codec<'a>) -> usize {
    let len = value.len_encoded();
    match field.length_info() {
        Some(length) => length_len(length, len) + len,
        None => len,
    }
}

/// Encoded length of one instance including its tag.
pub fn instance_len<'a>(field: &Field, value: &dyn Codec<'a>) -> usize {
    if field.is_header() {
        return header_len(field) + value.len_encoded();
    }
    field.tag_info().map_or(0, |tag| tag.width().bytes()) + value_len(field, value)
}

/// Encoded length of every instance held by `slot`, including tags and counter.
pub fn field_len<'a>(field: &Field, slot: &dyn Slot<'a>) -> usize {
    match field.counter() {
        Some(Counter::Prefix(width)) => {
            let tag = field.tag_info().map_or(0, |tag| tag.width().bytes());
            if slot.count() == 0 && tag > 0 {
                return 0;
            }
            tag + width.bytes() + slot.sum_len(&mut |value| value_len(field, value))
        }
        _ => slot.sum_len(&mut |value| instance_len(field, value)),
    }
}

/// Encoded length of the value `slot` would hold for `count`, see [write_count].
pub fn count_len<'a>(field: &Field, slot: &dyn Slot<'a>, count: usize) -> usize {
    let mut len = 0;
    let written = slot.with_count(count, &mut |value| {
        len = instance_len(field, value);
        Ok(())
    });
    match written {
        Some(_) => len,
        None => 0,
    }
}

/// Writes `value` and checks that it took exactly `len` bytes.
fn write_exact<'a>(
    ctx: &mut EncodeContext<'_>,
    field: &Field,
    value: &dyn Codec<'a>,
    len: usize,
) -> Result<(), Error> {
    let start = ctx.offset();
    value.write(ctx)?;
    let written = ctx.offset() - start;
    if written != len {
        return Err(Error::InvalidLength {
            field: field.name(),
            length: written,
            offset: start,
        });
    }
    Ok(())
}

/// Writes one instance without its tag.
pub fn write_value<'a>(
    ctx: &mut EncodeContext<'_>,
    field: &Field,
    value: &dyn Codec<'a>,
) -> Result<(), Error> {
    ctx.set_field(field.name());
    let Some(length) = field.length_info() else {
        return value.write(ctx);
    };
    let len = value.len_encoded();
    write_length(ctx, length, len)?;
    write_exact(ctx, field, value, len)
}

/// Writes one instance including its tag.
pub fn write_instance<'a>(
    ctx: &mut EncodeContext<'_>,
    field: &Field,
    value: &dyn Codec<'a>,
) -> Result<(), Error> {
    ctx.set_field(field.name());
    if let (true, Some(length), Some(tag)) =
        (field.is_header(), field.length_info(), field.tag_info())
    {
        write_length(ctx, length, instance_len(field, value))?;
        write_tag(ctx, tag)?;
        return write_exact(ctx, field, value, value.len_encoded());
    }
    if let Some(tag) = field.tag_info() {
        write_tag(ctx, tag)?;
    }
    write_value(ctx, field, value)
}

/// Writes every instance held by `slot`. Arity is checked by the caller.
pub fn write_field<'a>(
    ctx: &mut EncodeContext<'_>,
    field: &Field,
    slot: &dyn Slot<'a>,
) -> Result<(), Error> {
    ctx.set_field(field.name());
    let count = slot.count();
    match field.counter() {
        Some(Counter::Prefix(width)) => {
            if let Some(tag) = field.tag_info() {
                if count == 0 {
                    return Ok(());
                }
                write_tag(ctx, tag)?;
            }
            ctx.put_uint(count as u64, width)?;
            slot.for_each(&mut |value| write_value(ctx, field, value))
        }
        _ => slot.for_each(&mut |value| write_instance(ctx, field, value)),
    }
}

/// Writes the unset counter `slot` as a value holding `count`.
///
/// Fails with [Error::InvalidValue] if the value type of `slot` cannot represent `count`.
pub fn write_count<'a>(
    ctx: &mut EncodeContext<'_>,
    field: &Field,
    slot: &dyn Slot<'a>,
    count: usize,
) -> Result<(), Error> {
    ctx.set_field(field.name());
    match slot.with_count(count, &mut |value| write_instance(ctx, field, value)) {
        Some(result) => result,
        None => Err(Error::InvalidValue {
            field: field.name(),
            value: count as u64,
            offset: ctx.offset(),
        }),
    }
}

/// Reads one instance (its tag already consumed) and appends it to `slot`.
pub fn read_value<'a>(
    ctx: &mut DecodeContext<'a>,
    field: &Field,
    slot: &mut dyn Slot<'a>,
) -> Result<(), Error> {
    ctx.set_field(field.name());
    match field.length_info() {
        Some(length) => {
            let len = read_length(ctx, length)?;
            ctx.limit(len, |ctx| slot.read_next(ctx))
        }
        None => slot.read_next(ctx),
    }
}

/// Reads one instance including its tag, once [matches] holds, and appends it to `slot`.
pub fn read_instance<'a>(
    ctx: &mut DecodeContext<'a>,
    field: &Field,
    slot: &mut dyn Slot<'a>,
) -> Result<(), Error> {
    ctx.set_field(field.name());
    if let (true, Some(length), Some(tag)) =
        (field.is_header(), field.length_info(), field.tag_info())
    {
        let start = ctx.offset();
        let len = read_length(ctx, length)?;
        ctx.take(tag.width().bytes())?;
        return read_body(ctx, slot, start, len);
    }
    if let Some(tag) = field.tag_info() {
        ctx.take(tag.width().bytes())?;
    }
    read_value(ctx, field, slot)
}

/// Reads the value of a header-framed element starting at `start` whose header length is
/// `len`. The header has already been consumed.
pub fn read_body<'a>(
    ctx: &mut DecodeContext<'a>,
    slot: &mut dyn Slot<'a>,
    start: usize,
    len: usize,
) -> Result<(), Error> {
    let Some(body) = len.checked_sub(ctx.offset() - start) else {
        return Err(Error::InvalidLength {
            field: ctx.field(),
            length: len,
            offset: start,
        });
    };
    ctx.limit(body, |ctx| slot.read_next(ctx))
}

/// Skips one value of unknown type framed with `length`.
pub fn skip_value(ctx: &mut DecodeContext<'_>, length: Length) -> Result<(), Error> {
    let len = read_length(ctx, length)?;
    ctx.take(len).map(|_| ())
}

/// Reads the instance count in front of a [Counter::Prefix] field.
pub fn read_count(ctx: &mut DecodeContext<'_>, field: &Field, width: Width) -> Result<usize, Error> {
    ctx.set_field(field.name());
    let offset = ctx.offset();
    let count = ctx.get_uint(width)?;
    usize::try_from(count).map_err(|_| ctx.invalid(offset, count))
}

/// Fails if `count` instances exceed the arity of `field`.
pub fn check_excess(field: &Field, count: usize, offset: usize) -> Result<(), Error> {
    let max = field.arity_info().max();
    if count > max {
        return Err(Error::ExcessField {
            field: field.name(),
            expected: max,
            got: count,
            offset,
        });
    }
    Ok(())
}

/// Fails if `count` instances fall short of the arity of `field`.
pub fn check_missing(field: &Field, count: usize, offset: usize) -> Result<(), Error> {
    let min = field.arity_info().min();
    if count < min {
        return Err(Error::MissingField {
            field: field.name(),
            expected: min,
            got: count,
            offset,
        });
    }
    Ok(())
}
