//! Messages shared by the integration tests.

#![allow(dead_code)]

use wirefield_codec::{impl_choice, impl_message, Arity, Codec, EncodeContext, Length, Multi, Single, Width, U24};

/// Set of single-instance fields.
#[derive(Debug, Default, PartialEq)]
pub struct MsgSet<'a> {
    pub uc: Single<u8>,
    pub u16: Single<u16>,
    pub u24: Single<U24>,
    pub ip: Single<u32>,
    pub name: Single<&'a str>,
}
impl_message!('a, MsgSet<'a>, set "MSG_SET", {
    uc: tagged(0x0b, 2),
    u16: tagged(0x21, 2).length(Length::U8),
    u24: tagged(0x49, 2).length(Length::U8).optional(),
    ip: tagged(0x89, 2).optional(),
    name: tagged(0x22, 2).length(Length::U8).optional(),
});

/// Set of multi-instance fields.
#[derive(Debug, Default, PartialEq)]
pub struct MsgMset<'a> {
    pub uc: Multi<'a, u8>,
    pub u8: Multi<'a, u8>,
    pub u16: Multi<'a, u16>,
    pub u24: Multi<'a, U24>,
    pub ip: Multi<'a, u32>,
    pub name: Multi<'a, &'a str>,
}
impl_message!('a, MsgMset<'a>, set "MSG_MSET", {
    uc: tagged(0x0b, 2).arity(Arity::up_to(2)),
    u8: tagged(0x0c, 2).arity(Arity::up_to(2)),
    u16: tagged(0x21, 2).length(Length::U8).arity(Arity::up_to(2)),
    u24: tagged(0x49, 2).length(Length::U8).arity(Arity::optional_up_to(2)),
    ip: tagged(0x89, 2).arity(Arity::optional_up_to(2)),
    name: tagged(0x22, 2).length(Length::U8).arity(Arity::optional_up_to(3)),
});

/// Top-level protocol: a one-byte discriminant followed by the selected message.
#[derive(Debug, Default, PartialEq)]
pub enum Proto<'a> {
    #[default]
    Empty,
    Set(MsgSet<'a>),
    Mset(MsgMset<'a>),
}

impl<'a> Proto<'a> {
    /// Selects the set alternative, keeping it if already active.
    pub fn select_set(&mut self) -> &mut MsgSet<'a> {
        if !matches!(self, Proto::Set(_)) {
            *self = Proto::Set(MsgSet::default());
        }
        match self {
            Proto::Set(msg) => msg,
            _ => unreachable!(),
        }
    }

    /// Selects the multi-instance set alternative, keeping it if already active.
    pub fn select_mset(&mut self) -> &mut MsgMset<'a> {
        if !matches!(self, Proto::Mset(_)) {
            *self = Proto::Mset(MsgMset::default());
        }
        match self {
            Proto::Mset(msg) => msg,
            _ => unreachable!(),
        }
    }
}

impl_choice!('a, Proto<'a>, "PROTO", Width::U8, {
    0x04 => Set,
    0x14 => Mset,
});

/// Encodes `value` into a fresh buffer and returns the written bytes.
pub fn encode<'a>(value: &impl Codec<'a>) -> Vec<u8> {
    let mut buf = [0u8; 1024];
    let mut ctx = EncodeContext::new(&mut buf);
    ctx.encode(value).unwrap();
    assert_eq!(ctx.offset(), value.len_encoded());
    ctx.buffer().to_vec()
}
