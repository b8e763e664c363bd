//! Per-transaction encode and decode state.
//!
//! A context binds a byte cursor to a caller-supplied buffer and records the first error of the
//! transaction. Top-level calls ([EncodeContext::encode], [DecodeContext::decode]) return that
//! error as a `Result` and also keep it in the context: until the context is reset, later
//! top-level calls do nothing and return the same error.

use crate::{
    arena::Arena,
    codec::Codec,
    config::{Config, Policy},
    error::ErrorContext,
    field::{ByteOrder, Width},
    Error,
};
use bytes::{Buf, BufMut};
use tracing::debug;

/// Encode state over a fixed output buffer.
pub struct EncodeContext<'b> {
    buf: &'b mut [u8],
    offset: usize,
    field: &'static str,
    errors: ErrorContext,
}

impl<'b> EncodeContext<'b> {
    pub fn new(buf: &'b mut [u8]) -> Self {
        Self {
            buf,
            offset: 0,
            field: "",
            errors: ErrorContext::default(),
        }
    }

    /// Restarts at offset 0 of the same buffer and clears the recorded error.
    pub fn reset(&mut self) {
        self.offset = 0;
        self.field = "";
        self.errors.reset();
    }

    /// Binds a new buffer, restarts at offset 0 and clears the recorded error.
    pub fn reset_with(&mut self, buf: &'b mut [u8]) {
        self.buf = buf;
        self.reset();
    }

    /// Encodes `value` at the current offset.
    pub fn encode<'a, C: Codec<'a> + ?Sized>(&mut self, value: &C) -> Result<(), Error> {
        if let Some(err) = self.errors.error() {
            return Err(err.clone());
        }
        value.write(self).map_err(|err| {
            debug!(error = %err, "encode failed");
            self.errors.record(err)
        })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    /// Returns the bytes written so far.
    pub fn buffer(&self) -> &[u8] {
        &self.buf[..self.offset]
    }

    pub fn error(&self) -> Option<&Error> {
        self.errors.error()
    }

    pub fn error_ctx(&self) -> &ErrorContext {
        &self.errors
    }

    /// Name of the field being encoded.
    pub fn field(&self) -> &'static str {
        self.field
    }

    pub(crate) fn set_field(&mut self, name: &'static str) {
        self.field = name;
    }

    /// Reserves `len` bytes and lets `f` fill them.
    ///
    /// `f` must write exactly `len` bytes.
    pub fn put(&mut self, len: usize, f: impl FnOnce(&mut &mut [u8])) -> Result<(), Error> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(Error::Overflow {
                field: self.field,
                needed: len,
                remaining,
                offset: self.offset,
            });
        }
        let mut out = &mut self.buf[self.offset..self.offset + len];
        f(&mut out);
        debug_assert!(out.is_empty(), "put() did not fill the reserved bytes");
        self.offset += len;
        Ok(())
    }

    pub fn put_slice(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.put(bytes.len(), |buf| buf.put_slice(bytes))
    }

    /// Writes `value` as an integer of the given width.
    pub fn put_uint(&mut self, value: u64, width: Width) -> Result<(), Error> {
        if value > width.max_value() {
            return Err(self.invalid(value));
        }
        let bytes = width.bytes();
        self.put(bytes, |buf| match width.order() {
            ByteOrder::Big => buf.put_uint(value, bytes),
            ByteOrder::Little => buf.put_uint_le(value, bytes),
        })
    }

    /// Builds an [Error::InvalidValue] for the current field and offset.
    pub fn invalid(&self, value: u64) -> Error {
        Error::InvalidValue {
            field: self.field,
            value,
            offset: self.offset,
        }
    }
}

/// Decode state over an input slice and an [Arena].
///
/// Values decoded through this context may borrow from the input and from the arena for `'a`.
pub struct DecodeContext<'a> {
    input: &'a [u8],
    offset: usize,
    end: usize,
    arena: &'a Arena<'a>,
    config: Config,
    field: &'static str,
    errors: ErrorContext,
}

impl<'a> DecodeContext<'a> {
    pub fn new(input: &'a [u8], arena: &'a Arena<'a>) -> Self {
        Self {
            input,
            offset: 0,
            end: input.len(),
            arena,
            config: Config::default(),
            field: "",
            errors: ErrorContext::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Binds new input, restarts at offset 0 and clears the recorded error.
    ///
    /// The arena is not reset: values from earlier transactions may still borrow it.
    pub fn reset(&mut self, input: &'a [u8]) {
        self.input = input;
        self.offset = 0;
        self.end = input.len();
        self.field = "";
        self.errors.reset();
    }

    /// Decodes the whole input into `root`.
    ///
    /// `root` is cleared first. If decoding fails, its contents are indeterminate.
    pub fn decode<C: Codec<'a> + ?Sized>(&mut self, root: &mut C) -> Result<(), Error> {
        if let Some(err) = self.errors.error() {
            return Err(err.clone());
        }
        root.read(self)
            .and_then(|()| self.finish(root.name()))
            .map_err(|err| {
                debug!(error = %err, "decode failed");
                self.errors.record(err)
            })
    }

    fn finish(&mut self, name: &'static str) -> Result<(), Error> {
        let remaining = self.remaining();
        if remaining > 0 {
            if self.config.trailing == Policy::Reject {
                return Err(Error::ExtraData {
                    field: name,
                    remaining,
                    offset: self.offset,
                });
            }
            self.offset = self.end;
        }
        Ok(())
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left in the current region.
    pub fn remaining(&self) -> usize {
        self.end - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn arena(&self) -> &'a Arena<'a> {
        self.arena
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn error(&self) -> Option<&Error> {
        self.errors.error()
    }

    pub fn error_ctx(&self) -> &ErrorContext {
        &self.errors
    }

    /// Name of the field being decoded.
    pub fn field(&self) -> &'static str {
        self.field
    }

    pub(crate) fn set_field(&mut self, name: &'static str) {
        self.field = name;
    }

    /// Returns the next `len` bytes without consuming them.
    pub fn peek(&self, len: usize) -> Option<&'a [u8]> {
        if len > self.remaining() {
            return None;
        }
        let input: &'a [u8] = self.input;
        Some(&input[self.offset..self.offset + len])
    }

    /// Consumes the next `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], Error> {
        let bytes = self.peek(len).ok_or_else(|| self.truncated(len))?;
        self.offset += len;
        Ok(bytes)
    }

    /// Consumes the rest of the current region.
    pub fn take_rest(&mut self) -> &'a [u8] {
        let input: &'a [u8] = self.input;
        let bytes = &input[self.offset..self.end];
        self.offset = self.end;
        bytes
    }

    /// Reads an integer of the given width.
    pub fn get_uint(&mut self, width: Width) -> Result<u64, Error> {
        let bytes = width.bytes();
        let mut raw = self.take(bytes)?;
        Ok(match width.order() {
            ByteOrder::Big => raw.get_uint(bytes),
            ByteOrder::Little => raw.get_uint_le(bytes),
        })
    }

    /// Reads an integer of the given width without consuming it.
    pub fn peek_uint(&self, width: Width) -> Option<u64> {
        self.peek_uint_at(0, width)
    }

    /// Reads an integer of the given width `skip` bytes ahead, without consuming anything.
    pub fn peek_uint_at(&self, skip: usize, width: Width) -> Option<u64> {
        let bytes = width.bytes();
        let mut raw = &self.peek(skip + bytes)?[skip..];
        Some(match width.order() {
            ByteOrder::Big => raw.get_uint(bytes),
            ByteOrder::Little => raw.get_uint_le(bytes),
        })
    }

    /// Builds an [Error::TruncatedData] for `needed` bytes at the current offset.
    pub fn truncated(&self, needed: usize) -> Error {
        Error::TruncatedData {
            field: self.field,
            needed,
            remaining: self.remaining(),
            offset: self.offset,
        }
    }

    /// Builds an [Error::InvalidValue] for a value starting at `offset`.
    pub fn invalid(&self, offset: usize, value: u64) -> Error {
        Error::InvalidValue {
            field: self.field,
            value,
            offset,
        }
    }

    /// Runs `f` with the region restricted to the next `len` bytes.
    ///
    /// Bytes `f` leaves unread are handled according to [Config::trailing].
    pub(crate) fn limit<R>(
        &mut self,
        len: usize,
        f: impl FnOnce(&mut Self) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let field = self.field;
        let remaining = self.remaining();
        if len > remaining {
            return Err(Error::TruncatedData {
                field,
                needed: len,
                remaining,
                offset: self.offset,
            });
        }
        let outer = self.end;
        let end = self.offset + len;
        self.end = end;
        let result = f(self);
        self.end = outer;
        let value = result?;

        if self.offset < end {
            if self.config.trailing == Policy::Reject {
                return Err(Error::ExtraData {
                    field,
                    remaining: end - self.offset,
                    offset: self.offset,
                });
            }
            self.offset = end;
        }
        Ok(value)
    }
}
