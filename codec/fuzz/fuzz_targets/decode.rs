#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use wirefield_codec::{
    impl_choice, impl_message, Arena, Arity, Codec, Config, Counter, DecodeContext, EncodeContext,
    Length, Multi, Single, Width, U24,
};

#[derive(Debug, Default, PartialEq)]
struct Set<'a> {
    id: Single<u8>,
    port: Single<u16>,
    addr: Single<U24>,
    names: Multi<'a, &'a str>,
}
impl_message!('a, Set<'a>, set "SET", {
    id: tagged(0x01, 1),
    port: tagged(0x02, 1).length(Length::U8),
    addr: tagged(0x03, 1).length(Length::U8).optional(),
    names: tagged(0x04, 1).length(Length::Ber).arity(Arity::optional_up_to(4)),
});

#[derive(Debug, Default, PartialEq)]
struct Seq<'a> {
    count: Single<u8>,
    items: Multi<'a, u32>,
    flags: Multi<'a, bool>,
    tail: Single<&'a [u8]>,
}
impl_message!('a, Seq<'a>, sequence "SEQ", {
    count,
    items: arity(Arity::optional_up_to(8)).counted_by(Counter::Field(0)),
    flags: tagged(0x30, 1)
        .arity(Arity::optional_up_to(4))
        .counted_by(Counter::Prefix(Width::U8)),
    tail: length(Length::U16).optional(),
});

#[derive(Debug, Default, PartialEq)]
struct Header<'a> {
    text: Single<&'a str>,
    marks: Multi<'a, ()>,
}
impl_message!('a, Header<'a>, set "HEADER", {
    text: tagged(0x01, 2).length(Length::U16).header(),
    marks: tagged(0x02, 2).length(Length::U16).header().arity(Arity::optional_up_to(2)),
});

#[derive(Debug, Default, PartialEq)]
enum Root<'a> {
    #[default]
    Empty,
    Set(Set<'a>),
    Seq(Seq<'a>),
    Header(Header<'a>),
}

impl_choice!('a, Root<'a>, "ROOT", Width::U8, {
    0x01 => Set,
    0x02 => Seq,
    0x03 => Header,
});

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    lenient: bool,
    arena_size: u8,
    data: Vec<u8>,
}

fn fuzz(input: FuzzInput) {
    let config = if input.lenient {
        Config::lenient()
    } else {
        Config::default()
    };
    let mut storage = vec![0u8; input.arena_size as usize * 16];
    let arena = Arena::new(&mut storage);
    let mut root = Root::default();
    let mut ctx = DecodeContext::new(&input.data, &arena).with_config(config);
    let result = ctx.decode(&mut root);

    // The first error is kept by the context
    assert_eq!(ctx.error(), result.as_ref().err());
    if result.is_err() {
        return;
    }

    // Anything decoded must encode to exactly its computed length
    let mut buf = vec![0u8; root.len_encoded()];
    let mut encoder = EncodeContext::new(&mut buf);
    encoder
        .encode(&root)
        .expect("Failed to encode a successfully decoded input!");
    assert_eq!(encoder.offset(), root.len_encoded());

    // Re-encoding holds at most as many instances as were decoded
    let mut storage = vec![0u8; 4096];
    let arena = Arena::new(&mut storage);
    let mut decoded = Root::default();
    DecodeContext::new(encoder.buffer(), &arena)
        .decode(&mut decoded)
        .expect("Failed to decode a successfully encoded input!");
    assert_eq!(root, decoded);
}

fuzz_target!(|input: FuzzInput| {
    fuzz(input);
});
