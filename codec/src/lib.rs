//! Encode and decode schema-checked tag/length/value messages.
//!
//! # Overview
//!
//! A message format is described once, as a list of [Field] descriptors, and checked when it
//! is used:
//! - Encode writes a populated message into a caller-supplied fixed buffer, after validating
//!   field presence and instance counts.
//! - Decode reads untrusted input into an empty message, in place, placing the storage of
//!   multi-instance fields in a caller-supplied [Arena].
//!
//! # Containers
//!
//! - Sequence: fields appear in declared order ([Schema::sequence]).
//! - Set: fields appear in any order and are dispatched by tag ([Schema::set]).
//! - Choice: a discriminant selects one of several alternatives ([ChoiceSchema]).
//!
//! Each field instance is framed as `[tag?][length?][value]`, or `[length][tag][value]` for
//! header-framed fields ([Field::header]). Lengths are fixed-width integers or BER definite
//! lengths. A multi-instance field may delegate its instance count
//! to a prefix or to an earlier field (see [Counter]).
//!
//! # Supported Types
//!
//! Values are pluggable through the [Codec] trait. Natively supported:
//! - Integers: `u8`, `u16`, `u32`, `u64`, `i8`, `i16`, `i32`, `i64`, [U24], `bool`
//! - The null value `()`, which has no content
//! - Fixed-size byte arrays `[u8; N]`
//! - Borrowed octet and UTF-8 strings: `&[u8]`, `&str`
//!
//! # Example
//!
//! ```
//! use wirefield_codec::{impl_message, Arena, DecodeContext, EncodeContext, Length, Single};
//!
//! #[derive(Default)]
//! struct Msg {
//!     flag: Single<u8>,
//!     value: Single<u16>,
//! }
//! impl_message!('a, Msg, set "msg", {
//!     flag: tagged(0x0b, 2),
//!     value: tagged(0x21, 2).length(Length::U8),
//! });
//!
//! let mut msg = Msg::default();
//! msg.flag.set(0x11);
//! msg.value.set(0x35D9);
//!
//! let mut buf = [0u8; 16];
//! let mut ctx = EncodeContext::new(&mut buf);
//! ctx.encode(&msg).unwrap();
//! assert_eq!(ctx.buffer(), &[0x00, 0x0B, 0x11, 0x00, 0x21, 0x02, 0x35, 0xD9]);
//!
//! // Fields of a set may arrive in any order
//! let input = [0x00, 0x21, 0x02, 0x35, 0xD9, 0x00, 0x0B, 0x11];
//! let mut storage = [0u8; 64];
//! let arena = Arena::new(&mut storage);
//! let mut ctx = DecodeContext::new(&input, &arena);
//! let mut decoded = Msg::default();
//! ctx.decode(&mut decoded).unwrap();
//! assert_eq!(decoded.flag.get(), Some(&0x11));
//! assert_eq!(decoded.value.get(), Some(&0x35D9));
//! ```
//!
//! # Errors
//!
//! The first violation aborts the transaction. It is returned as an [Error] and also kept by
//! the context until it is reset, so later calls on the same context return it again.

pub mod arena;
pub mod choice;
pub mod codec;
pub mod config;
pub mod context;
pub mod error;
pub mod field;
mod frame;
pub mod instance;
pub mod message;
pub mod schema;
mod sequence;
mod set;
pub mod types;

// Re-export main types and traits
pub use arena::Arena;
pub use codec::{Choice, Codec, Message};
pub use config::{Config, Policy};
pub use context::{DecodeContext, EncodeContext};
pub use error::{Error, ErrorContext, Kind};
pub use field::{Arity, ByteOrder, Counter, Field, Framing, Length, Tag, Width};
pub use instance::{Multi, Single, Slot};
pub use schema::{Alternative, ChoiceSchema, Layout, Schema, SchemaError};
pub use types::primitives::U24;
