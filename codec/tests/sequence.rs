use test_case::test_case;
use wirefield_codec::{
    impl_message, Arena, Arity, Codec, Config, Counter, DecodeContext, EncodeContext, Error, Kind,
    Length, Multi, Single, Tag, Width,
};
use wirefield_macros::test_traced;

#[derive(Debug, Default, PartialEq)]
struct Route<'a> {
    id: Single<u8>,
    hops: Multi<'a, u16>,
    note: Single<&'a str>,
}
impl_message!('a, Route<'a>, sequence "ROUTE", {
    id,
    hops: tagged(0x0c, 1).arity(Arity::between(2, 3)),
    note: tagged(0x22, 1).length(Length::U8).optional(),
});

/// Encodes a route with `hops` hops, returning the written bytes.
fn encode_route(hops: u16) -> Result<Vec<u8>, Error> {
    let mut storage = [0u8; 256];
    let arena = Arena::new(&mut storage);
    let mut route = Route::default();
    route.id.set(7);
    for hop in 0..hops {
        route.hops.push(&arena, 0x0100 + hop)?;
    }

    let mut buf = [0u8; 64];
    let mut ctx = EncodeContext::new(&mut buf);
    ctx.encode(&route)?;
    Ok(ctx.buffer().to_vec())
}

/// Builds the wire form of a route with `hops` hops and decodes it.
fn decode_route(hops: u8) -> Result<usize, Error> {
    let mut input = vec![7];
    for hop in 0..hops {
        input.extend_from_slice(&[0x0c, 0x01, hop]);
    }
    let mut storage = [0u8; 256];
    let arena = Arena::new(&mut storage);
    let mut route = Route::default();
    DecodeContext::new(&input, &arena).decode(&mut route)?;
    Ok(route.hops.len())
}

#[test_case(1 => Err(Error::MissingField { field: "hops", expected: 2, got: 1, offset: 1 }); "below minimum")]
#[test_case(2 => Ok(7); "minimum")]
#[test_case(3 => Ok(10); "maximum")]
#[test_case(4 => Err(Error::ExcessField { field: "hops", expected: 3, got: 4, offset: 1 }); "above maximum")]
fn test_encode_arity(hops: u16) -> Result<usize, Error> {
    encode_route(hops).map(|encoded| encoded.len())
}

#[test_case(1 => Err(Error::MissingField { field: "hops", expected: 2, got: 1, offset: 4 }); "below minimum")]
#[test_case(2 => Ok(2); "minimum")]
#[test_case(3 => Ok(3); "maximum")]
#[test_case(4 => Err(Error::ExcessField { field: "hops", expected: 3, got: 4, offset: 10 }); "above maximum")]
fn test_decode_arity(hops: u8) -> Result<usize, Error> {
    decode_route(hops)
}

#[test_traced]
fn test_route_round_trip() {
    let mut storage = [0u8; 256];
    let arena = Arena::new(&mut storage);
    let mut route = Route::default();
    route.id.set(0x42);
    route.hops.push(&arena, 0x0A0B).unwrap();
    route.hops.push(&arena, 0x0C0D).unwrap();
    route.note.set("via");

    let mut buf = [0u8; 64];
    let mut ctx = EncodeContext::new(&mut buf);
    ctx.encode(&route).unwrap();
    assert_eq!(
        ctx.buffer(),
        &[0x42, 0x0C, 0x0A, 0x0B, 0x0C, 0x0C, 0x0D, 0x22, 0x03, b'v', b'i', b'a']
    );

    let encoded = ctx.buffer().to_vec();
    let mut decoded = Route::default();
    DecodeContext::new(&encoded, &arena)
        .decode(&mut decoded)
        .unwrap();
    assert_eq!(decoded, route);
}

#[test_traced]
fn test_trailing_data() {
    let input = [0x07, 0x0C, 0x00, 0x01, 0x0C, 0x00, 0x02, 0xFF];
    let mut storage = [0u8; 256];
    let arena = Arena::new(&mut storage);
    let mut route = Route::default();

    let err = DecodeContext::new(&input, &arena)
        .decode(&mut route)
        .unwrap_err();
    assert_eq!(
        err,
        Error::ExtraData {
            field: "ROUTE",
            remaining: 1,
            offset: 7
        }
    );

    let mut ctx = DecodeContext::new(&input, &arena).with_config(Config::lenient());
    ctx.decode(&mut route).unwrap();
    assert_eq!(route.hops.len(), 2);
    assert!(!route.note.is_set());
}

#[test_traced]
fn test_status_is_sticky() {
    let mut storage = [0u8; 256];
    let arena = Arena::new(&mut storage);
    let mut route = Route::default();
    route.id.set(1);
    route.hops.push(&arena, 0x0102).unwrap();

    let mut buf = [0u8; 64];
    let mut ctx = EncodeContext::new(&mut buf);
    let err = ctx.encode(&route).unwrap_err();
    assert_eq!(err.kind(), Kind::MissingField);
    assert_eq!(err.field(), "hops");
    assert_eq!(err.offset(), Some(1));

    // Further calls do nothing until reset
    route.hops.push(&arena, 0x0304).unwrap();
    assert_eq!(ctx.encode(&route).unwrap_err(), err);
    assert_eq!(ctx.error(), Some(&err));
    assert_eq!(ctx.offset(), 1);

    ctx.reset();
    ctx.encode(&route).unwrap();
    assert_eq!(ctx.buffer(), &[0x01, 0x0C, 0x01, 0x02, 0x0C, 0x03, 0x04]);
}

#[test_traced]
fn test_reset_is_idempotent() {
    let mut storage = [0u8; 256];
    let arena = Arena::new(&mut storage);
    let mut route = Route::default();
    route.id.set(9);
    route.hops.push(&arena, 0x1111).unwrap();
    route.hops.push(&arena, 0x2222).unwrap();

    let mut buf = [0u8; 64];
    let mut ctx = EncodeContext::new(&mut buf);
    ctx.encode(&route).unwrap();
    let first = ctx.buffer().to_vec();

    // A transaction ending at any offset restarts at 0
    for _ in 0..3 {
        ctx.reset();
        assert_eq!(ctx.offset(), 0);
        ctx.encode(&route).unwrap();
        assert_eq!(ctx.buffer(), first.as_slice());
    }
    ctx.reset();
    ctx.reset();
    ctx.encode(&7u8).unwrap();
    assert_eq!(ctx.buffer(), &[7]);
}

#[test_traced]
fn test_encode_overflow() {
    let mut storage = [0u8; 256];
    let arena = Arena::new(&mut storage);
    let mut route = Route::default();
    route.id.set(9);
    route.hops.push(&arena, 0x1111).unwrap();
    route.hops.push(&arena, 0x2222).unwrap();

    let mut buf = [0u8; 5];
    let mut ctx = EncodeContext::new(&mut buf);
    let err = ctx.encode(&route).unwrap_err();
    assert_eq!(
        err,
        Error::Overflow {
            field: "hops",
            needed: 2,
            remaining: 0,
            offset: 5
        }
    );
}

#[derive(Debug, Default, PartialEq)]
struct Counted<'a> {
    count: Single<u8>,
    items: Multi<'a, u16>,
    flags: Multi<'a, u8>,
    trailer: Single<&'a [u8]>,
}
impl_message!('a, Counted<'a>, sequence "COUNTED", {
    count,
    items: arity(Arity::up_to(4)).counted_by(Counter::Field(0)),
    flags: tagged(0x30, 1)
        .arity(Arity::optional_up_to(3))
        .counted_by(Counter::Prefix(Width::U8)),
    trailer: length(Length::Ber).optional(),
});

#[test_traced]
fn test_counters_round_trip() {
    let mut storage = [0u8; 512];
    let arena = Arena::new(&mut storage);
    let mut msg = Counted::default();
    msg.count.set(2);
    msg.items.push(&arena, 0x0001).unwrap();
    msg.items.push(&arena, 0x0002).unwrap();
    msg.flags.push(&arena, 0xAA).unwrap();
    msg.flags.push(&arena, 0xBB).unwrap();

    let mut buf = [0u8; 512];
    let mut ctx = EncodeContext::new(&mut buf);
    ctx.encode(&msg).unwrap();
    assert_eq!(
        ctx.buffer(),
        &[0x02, 0x00, 0x01, 0x00, 0x02, 0x30, 0x02, 0xAA, 0xBB]
    );

    let encoded = ctx.buffer().to_vec();
    let mut decoded = Counted::default();
    DecodeContext::new(&encoded, &arena)
        .decode(&mut decoded)
        .unwrap();
    assert_eq!(decoded, msg);
}

#[test_traced]
fn test_counter_mismatch() {
    let mut storage = [0u8; 512];
    let arena = Arena::new(&mut storage);
    let mut msg = Counted::default();
    msg.count.set(3);
    msg.items.push(&arena, 0x0001).unwrap();
    msg.items.push(&arena, 0x0002).unwrap();

    let mut buf = [0u8; 64];
    let mut ctx = EncodeContext::new(&mut buf);
    assert_eq!(
        ctx.encode(&msg).unwrap_err(),
        Error::InvalidValue {
            field: "count",
            value: 3,
            offset: 1
        }
    );
}

#[test_traced]
fn test_counter_derived_on_encode() {
    let mut storage = [0u8; 512];
    let arena = Arena::new(&mut storage);
    let mut msg = Counted::default();
    msg.items.push(&arena, 0x0001).unwrap();
    msg.items.push(&arena, 0x0002).unwrap();
    msg.items.push(&arena, 0x0003).unwrap();

    let mut buf = [0u8; 64];
    let mut ctx = EncodeContext::new(&mut buf);
    ctx.encode(&msg).unwrap();
    assert_eq!(ctx.buffer(), &[0x03, 0x00, 0x01, 0x00, 0x02, 0x00, 0x03]);
    assert_eq!(ctx.offset(), msg.len_encoded());
    assert!(!msg.count.is_set());

    let encoded = ctx.buffer().to_vec();
    let mut decoded = Counted::default();
    DecodeContext::new(&encoded, &arena)
        .decode(&mut decoded)
        .unwrap();
    assert_eq!(decoded.count.get(), Some(&3));
    assert_eq!(decoded.items, msg.items);
}

/// Sequence whose counter cannot hold every count its field allows.
#[derive(Debug, Default, PartialEq)]
struct Narrow<'a> {
    count: Single<bool>,
    items: Multi<'a, u8>,
}
impl_message!('a, Narrow<'a>, sequence "NARROW", {
    count: optional(),
    items: arity(Arity::optional_up_to(4)).counted_by(Counter::Field(0)),
});

#[test_traced]
fn test_counter_not_derivable() {
    let mut storage = [0u8; 64];
    let arena = Arena::new(&mut storage);
    let mut msg = Narrow::default();

    // An optional counter of nothing stays absent
    let mut buf = [0u8; 16];
    let mut ctx = EncodeContext::new(&mut buf);
    ctx.encode(&msg).unwrap();
    assert!(ctx.buffer().is_empty());

    msg.items.push(&arena, 0x01).unwrap();
    let mut ctx = EncodeContext::new(&mut buf);
    assert_eq!(
        ctx.encode(&msg).unwrap_err(),
        Error::InvalidValue {
            field: "count",
            value: 1,
            offset: 0
        }
    );
}

#[test_case(&[0x01, 0x00, 0x05] => Ok(1); "one item")]
#[test_case(&[0x05, 0x00, 0x01] => Err(Kind::ExcessField); "count above maximum")]
#[test_case(&[0x02, 0x00, 0x01] => Err(Kind::TruncatedData); "fewer items than counted")]
#[test_case(&[0x00] => Err(Kind::MissingField); "no items")]
fn test_counter_field_decode(input: &[u8]) -> Result<usize, Kind> {
    let mut storage = [0u8; 256];
    let arena = Arena::new(&mut storage);
    let mut msg = Counted::default();
    DecodeContext::new(input, &arena)
        .decode(&mut msg)
        .map_err(|err| err.kind())?;
    Ok(msg.items.len())
}

#[test_traced]
fn test_ber_long_form() {
    let payload = [0x5Au8; 200];
    let mut storage = [0u8; 256];
    let arena = Arena::new(&mut storage);
    let mut msg = Counted::default();
    msg.count.set(1);
    msg.items.push(&arena, 0x0102).unwrap();
    msg.trailer.set(&payload);

    let mut buf = [0u8; 512];
    let mut ctx = EncodeContext::new(&mut buf);
    ctx.encode(&msg).unwrap();
    let encoded = ctx.buffer().to_vec();
    assert_eq!(&encoded[..5], &[0x01, 0x01, 0x02, 0x81, 0xC8]);
    assert_eq!(encoded.len(), 5 + payload.len());

    let mut decoded = Counted::default();
    DecodeContext::new(&encoded, &arena)
        .decode(&mut decoded)
        .unwrap();
    assert_eq!(decoded.trailer.get(), Some(&&payload[..]));
    assert!(decoded.flags.is_empty());
}

#[derive(Debug, Default, PartialEq)]
struct Inner {
    a: Single<u8>,
    b: Single<u8>,
}
impl_message!('a, Inner, sequence "INNER", { a, b });

#[derive(Debug, Default, PartialEq)]
struct Outer {
    inner: Single<Inner>,
    crc: Single<u16>,
}
impl_message!('a, Outer, sequence "OUTER", {
    inner: length(Length::Ber),
    crc,
});

#[test_traced]
fn test_nested_message() {
    let mut outer = Outer::default();
    let inner = outer.inner.get_or_default();
    inner.a.set(1);
    inner.b.set(2);
    outer.crc.set(0xBEEF);

    let mut buf = [0u8; 16];
    let mut ctx = EncodeContext::new(&mut buf);
    ctx.encode(&outer).unwrap();
    assert_eq!(ctx.buffer(), &[0x02, 0x01, 0x02, 0xBE, 0xEF]);

    let encoded = ctx.buffer().to_vec();
    let mut storage = [0u8; 0];
    let arena = Arena::new(&mut storage);
    let mut decoded = Outer::default();
    DecodeContext::new(&encoded, &arena)
        .decode(&mut decoded)
        .unwrap();
    assert_eq!(decoded, outer);
}

#[test_traced]
fn test_nested_message_extra_data() {
    let input = [0x03, 0x01, 0x02, 0x03, 0xBE, 0xEF];
    let mut storage = [0u8; 0];
    let arena = Arena::new(&mut storage);
    let mut outer = Outer::default();

    let err = DecodeContext::new(&input, &arena)
        .decode(&mut outer)
        .unwrap_err();
    assert_eq!(
        err,
        Error::ExtraData {
            field: "inner",
            remaining: 1,
            offset: 3
        }
    );

    let mut ctx = DecodeContext::new(&input, &arena).with_config(Config::lenient());
    ctx.decode(&mut outer).unwrap();
    assert_eq!(outer.crc.get(), Some(&0xBEEF));
    assert_eq!(outer.inner.get().and_then(|inner| inner.b.get()), Some(&2));
}

#[derive(Debug, Default, PartialEq)]
struct LittleEndian {
    value: Single<u32>,
}
impl_message!('a, LittleEndian, sequence "LE", {
    value: tag(Tag::new(0x0102, Width::U16.little_endian()))
        .length(Length::Fixed(Width::U16.little_endian())),
});

#[test_traced]
fn test_little_endian_framing() {
    let mut msg = LittleEndian::default();
    msg.value.set(0xDEADBEEF);

    let mut buf = [0u8; 16];
    let mut ctx = EncodeContext::new(&mut buf);
    ctx.encode(&msg).unwrap();
    assert_eq!(
        ctx.buffer(),
        &[0x02, 0x01, 0x04, 0x00, 0xDE, 0xAD, 0xBE, 0xEF]
    );

    let encoded = ctx.buffer().to_vec();
    let mut storage = [0u8; 0];
    let arena = Arena::new(&mut storage);
    let mut decoded = LittleEndian::default();
    DecodeContext::new(&encoded, &arena)
        .decode(&mut decoded)
        .unwrap();
    assert_eq!(decoded, msg);
}

/// Sequence whose optional first field would consume the value of the second.
#[derive(Debug, Default)]
struct Shadowed {
    a: Single<u8>,
    b: Single<u8>,
}
impl_message!('a, Shadowed, sequence "SHADOWED", {
    a: tagged(0x01, 1).optional(),
    b: tagged(0x01, 1),
});

#[test]
#[should_panic(expected = "duplicate tag 0x1 in 'SHADOWED'")]
fn test_shadowed_tag_is_rejected() {
    let mut msg = Shadowed::default();
    msg.b.set(9);
    let mut buf = [0u8; 4];
    let _ = EncodeContext::new(&mut buf).encode(&msg);
}
