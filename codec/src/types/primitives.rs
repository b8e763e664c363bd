//! Codec implementations for Rust primitive types.
//!
//! All multi-byte integers are written big-endian. Unsigned integers can also serve as the
//! counter of a multi-instance field (see [crate::Counter::Field]). The unit type `()` is the
//! null value: present or absent, with no bytes of its own.

use crate::{Codec, DecodeContext, EncodeContext, Error};
use bytes::{Buf, BufMut};

macro_rules! impl_numeric {
    ($type:ty, $read_method:ident, $write_method:ident, $as_count:expr, $from_count:expr) => {
        impl Codec<'_> for $type {
            #[inline]
            fn len_encoded(&self) -> usize {
                core::mem::size_of::<$type>()
            }

            #[inline]
            fn write(&self, ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
                ctx.put(core::mem::size_of::<$type>(), |buf| buf.$write_method(*self))
            }

            #[inline]
            fn read(&mut self, ctx: &mut DecodeContext<'_>) -> Result<(), Error> {
                let mut raw = ctx.take(core::mem::size_of::<$type>())?;
                *self = raw.$read_method();
                Ok(())
            }

            fn as_count(&self) -> Option<usize> {
                ($as_count)(*self)
            }

            fn from_count(count: usize) -> Option<Self> {
                ($from_count)(count)
            }
        }
    };
}

impl_numeric!(
    u8,
    get_u8,
    put_u8,
    |v: u8| usize::try_from(v).ok(),
    |n: usize| u8::try_from(n).ok()
);
impl_numeric!(
    u16,
    get_u16,
    put_u16,
    |v: u16| usize::try_from(v).ok(),
    |n: usize| u16::try_from(n).ok()
);
impl_numeric!(
    u32,
    get_u32,
    put_u32,
    |v: u32| usize::try_from(v).ok(),
    |n: usize| u32::try_from(n).ok()
);
impl_numeric!(
    u64,
    get_u64,
    put_u64,
    |v: u64| usize::try_from(v).ok(),
    |n: usize| u64::try_from(n).ok()
);
impl_numeric!(i8, get_i8, put_i8, |_: i8| None, |_: usize| None);
impl_numeric!(i16, get_i16, put_i16, |_: i16| None, |_: usize| None);
impl_numeric!(i32, get_i32, put_i32, |_: i32| None, |_: usize| None);
impl_numeric!(i64, get_i64, put_i64, |_: i64| None, |_: usize| None);

/// Unsigned 24-bit integer, written as 3 big-endian octets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct U24(u32);

impl U24 {
    pub const MAX: u32 = 0xFF_FFFF;

    /// Returns `None` if `value` does not fit in 24 bits.
    pub const fn new(value: u32) -> Option<Self> {
        if value > Self::MAX {
            return None;
        }
        Some(Self(value))
    }

    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for U24 {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(value)
    }
}

impl From<U24> for u32 {
    fn from(value: U24) -> Self {
        value.0
    }
}

impl Codec<'_> for U24 {
    fn len_encoded(&self) -> usize {
        3
    }

    fn write(&self, ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
        ctx.put(3, |buf| buf.put_uint(u64::from(self.0), 3))
    }

    fn read(&mut self, ctx: &mut DecodeContext<'_>) -> Result<(), Error> {
        let mut raw = ctx.take(3)?;
        self.0 = raw.get_uint(3) as u32;
        Ok(())
    }

    fn as_count(&self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }

    fn from_count(count: usize) -> Option<Self> {
        u32::try_from(count).ok().and_then(Self::new)
    }
}

impl Codec<'_> for () {
    fn len_encoded(&self) -> usize {
        0
    }

    fn write(&self, _: &mut EncodeContext<'_>) -> Result<(), Error> {
        Ok(())
    }

    fn read(&mut self, _: &mut DecodeContext<'_>) -> Result<(), Error> {
        Ok(())
    }
}

impl Codec<'_> for bool {
    fn len_encoded(&self) -> usize {
        1
    }

    fn write(&self, ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
        ctx.put(1, |buf| buf.put_u8(u8::from(*self)))
    }

    fn read(&mut self, ctx: &mut DecodeContext<'_>) -> Result<(), Error> {
        let offset = ctx.offset();
        let mut raw = ctx.take(1)?;
        *self = match raw.get_u8() {
            0 => false,
            1 => true,
            other => return Err(ctx.invalid(offset, u64::from(other))),
        };
        Ok(())
    }
}

// Constant-size array implementation
impl<const N: usize> Codec<'_> for [u8; N] {
    fn len_encoded(&self) -> usize {
        N
    }

    fn write(&self, ctx: &mut EncodeContext<'_>) -> Result<(), Error> {
        ctx.put_slice(self)
    }

    fn read(&mut self, ctx: &mut DecodeContext<'_>) -> Result<(), Error> {
        self.copy_from_slice(ctx.take(N)?);
        Ok(())
    }
}
