//! Codec implementations for borrowed byte and string types.
//!
//! Both decode in place: the value borrows the decode input and takes every byte left in the
//! current region. They are meant for fields framed by a length prefix, or for the last field of
//! a container.

use crate::{Codec, DecodeContext, EncodeContext, Error};

impl<'a> Codec<'a> for &'a [u8] {
    #[inline]
    fn len_encoded(&self) -> usize {
        self.len()
    }

    #[inline]
    fn write(&self, ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
        ctx.put_slice(self)
    }

    #[inline]
    fn read(&mut self, ctx: &mut DecodeContext<'a>) -> Result<(), Error> {
        *self = ctx.take_rest();
        Ok(())
    }
}

impl<'a> Codec<'a> for &'a str {
    #[inline]
    fn len_encoded(&self) -> usize {
        self.len()
    }

    #[inline]
    fn write(&self, ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
        ctx.put_slice(self.as_bytes())
    }

    fn read(&mut self, ctx: &mut DecodeContext<'a>) -> Result<(), Error> {
        let start = ctx.offset();
        let bytes = ctx.take_rest();
        *self = core::str::from_utf8(bytes).map_err(|err| {
            let position = err.valid_up_to();
            ctx.invalid(start + position, u64::from(bytes[position]))
        })?;
        Ok(())
    }
}
