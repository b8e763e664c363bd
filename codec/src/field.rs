//! Field descriptors.
//!
//! A [Field] classifies one schema field along two independent axes:
//!
//! - framing: nothing, a tag, a length prefix, or both (see [Framing]), where a header
//!   length may precede the tag and cover the whole element;
//! - arity: how many instances may appear (see [Arity]), optionally with the instance count
//!   delegated to a [Counter] rather than inferred from repeated tags.
//!
//! Every constructor is a `const fn` that rejects invalid combinations by panicking. Declaring
//! descriptors as `const` or `static` items therefore turns an invalid schema into a build
//! error:
//!
//! ```
//! use wirefield_codec::{Arity, Field, Length};
//!
//! const NAME: Field = Field::new("name").tagged(0x22, 2).length(Length::U8);
//! const HOPS: Field = Field::new("hops").tagged(0x0c, 2).arity(Arity::between(2, 3));
//! ```

/// Byte order of a multi-byte integer on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Big,
    Little,
}

/// Width and byte order of an integer used for tags, lengths and counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Width {
    bytes: u8,
    order: ByteOrder,
}

impl Width {
    pub const U8: Width = Width::new(1);
    pub const U16: Width = Width::new(2);
    pub const U24: Width = Width::new(3);
    pub const U32: Width = Width::new(4);

    /// Creates a big-endian width of `bytes` octets.
    pub const fn new(bytes: u8) -> Self {
        assert!(bytes >= 1 && bytes <= 8, "WIDTH SHOULD BE 1 TO 8 OCTETS");
        Self {
            bytes,
            order: ByteOrder::Big,
        }
    }

    /// Switches to little-endian byte order.
    pub const fn little_endian(self) -> Self {
        Self {
            order: ByteOrder::Little,
            ..self
        }
    }

    pub const fn bytes(&self) -> usize {
        self.bytes as usize
    }

    pub const fn order(&self) -> ByteOrder {
        self.order
    }

    /// Largest value representable in this width.
    pub const fn max_value(&self) -> u64 {
        if self.bytes == 8 {
            u64::MAX
        } else {
            (1u64 << (self.bytes as u32 * 8)) - 1
        }
    }
}

/// A tag identifying a field (or a [crate::Choice] alternative) on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Tag {
    value: u64,
    width: Width,
}

impl Tag {
    pub const fn new(value: u64, width: Width) -> Self {
        assert!(value <= width.max_value(), "TAG VALUE SHOULD FIT ITS WIDTH");
        Self { value, width }
    }

    pub const fn value(&self) -> u64 {
        self.value
    }

    pub const fn width(&self) -> Width {
        self.width
    }
}

/// Encoding of a length prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Length {
    /// Fixed-width integer.
    Fixed(Width),
    /// ASN.1 BER definite length (short form below 128, long form otherwise).
    Ber,
}

impl Length {
    pub const U8: Length = Length::Fixed(Width::U8);
    pub const U16: Length = Length::Fixed(Width::U16);
    pub const U32: Length = Length::Fixed(Width::U32);
}

/// Permitted instance count range of a field, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Arity {
    min: usize,
    max: usize,
}

impl Arity {
    /// Mandatory, exactly one instance.
    pub const ONE: Arity = Arity { min: 1, max: 1 };

    /// Optional, zero or one instance.
    pub const OPTIONAL: Arity = Arity { min: 0, max: 1 };

    /// Mandatory multi-instance field with `min..=max` instances.
    pub const fn between(min: usize, max: usize) -> Self {
        assert!(min >= 1, "MIN SHOULD BE AT LEAST 1 OR OPTIONAL USED");
        assert!(max > min, "MAX SHOULD BE MORE THAN MIN OR ARITY USED");
        Self { min, max }
    }

    /// Mandatory multi-instance field with `1..=max` instances.
    pub const fn up_to(max: usize) -> Self {
        assert!(max > 1, "MAX SHOULD BE MORE THAN 1 OR NOT SPECIFIED");
        Self { min: 1, max }
    }

    /// Optional multi-instance field with `0..=max` instances.
    pub const fn optional_up_to(max: usize) -> Self {
        assert!(max > 1, "MAX SHOULD BE MORE THAN 1 OR OPTIONAL USED");
        Self { min: 0, max }
    }

    /// Exactly `num` instances.
    pub const fn fixed(num: usize) -> Self {
        assert!(num > 1, "ARITY SHOULD BE MORE THAN 1 OR NOT SPECIFIED");
        Self { min: num, max: num }
    }

    pub const fn min(&self) -> usize {
        self.min
    }

    pub const fn max(&self) -> usize {
        self.max
    }

    /// True if more than one instance may appear.
    pub const fn is_multi(&self) -> bool {
        self.max > 1
    }

    /// True if at least one instance is required.
    pub const fn is_mandatory(&self) -> bool {
        self.min >= 1
    }

    /// Returns true if `count` instances satisfy this arity.
    pub const fn contains(&self, count: usize) -> bool {
        count >= self.min && count <= self.max
    }
}

/// Where the instance count of a multi-instance field comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Counter {
    /// The count is written once in front of the values.
    Prefix(Width),
    /// The count is the integer value of an earlier field of the same sequence, by index.
    Field(usize),
}

/// Framing classification of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Framing {
    None,
    Tag,
    Length,
    TagLength,
    /// `[length][tag][value]`, the length counting the whole element.
    Header,
}

/// Schema-level descriptor of one field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    name: &'static str,
    tag: Option<Tag>,
    length: Option<Length>,
    arity: Arity,
    counter: Option<Counter>,
    header: bool,
}

impl Field {
    /// Creates an unframed, mandatory, single-instance field.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            tag: None,
            length: None,
            arity: Arity::ONE,
            counter: None,
            header: false,
        }
    }

    /// Prefixes every instance with `tag`.
    pub const fn tag(self, tag: Tag) -> Self {
        Self {
            tag: Some(tag),
            ..self
        }
    }

    /// Prefixes every instance with a big-endian tag of `bytes` octets.
    pub const fn tagged(self, value: u64, bytes: u8) -> Self {
        self.tag(Tag::new(value, Width::new(bytes)))
    }

    /// Prefixes every instance value with its encoded length.
    pub const fn length(self, length: Length) -> Self {
        assert!(
            !self.header || matches!(length, Length::Fixed(_)),
            "HEADER REQUIRES A FIXED LENGTH"
        );
        Self {
            length: Some(length),
            ..self
        }
    }

    pub const fn arity(self, arity: Arity) -> Self {
        assert!(
            self.counter.is_none() || arity.is_multi(),
            "COUNTER REQUIRES MULTI-INSTANCE ARITY"
        );
        Self { arity, ..self }
    }

    /// Shorthand for [Arity::OPTIONAL].
    pub const fn optional(self) -> Self {
        self.arity(Arity::OPTIONAL)
    }

    /// Delegates the instance count to `counter`.
    pub const fn counted_by(self, counter: Counter) -> Self {
        assert!(self.arity.is_multi(), "COUNTER REQUIRES MULTI-INSTANCE ARITY");
        assert!(
            !self.header || !matches!(counter, Counter::Prefix(_)),
            "HEADER EXCLUDES A COUNT PREFIX"
        );
        Self {
            counter: Some(counter),
            ..self
        }
    }

    /// Moves the length in front of the tag and makes it count the whole element, header
    /// included: `[length][tag][value]`.
    pub const fn header(self) -> Self {
        assert!(self.tag.is_some(), "HEADER REQUIRES A TAG");
        assert!(
            matches!(self.length, Some(Length::Fixed(_))),
            "HEADER REQUIRES A FIXED LENGTH"
        );
        assert!(
            !matches!(self.counter, Some(Counter::Prefix(_))),
            "HEADER EXCLUDES A COUNT PREFIX"
        );
        Self {
            header: true,
            ..self
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn tag_info(&self) -> Option<Tag> {
        self.tag
    }

    pub const fn length_info(&self) -> Option<Length> {
        self.length
    }

    pub const fn arity_info(&self) -> Arity {
        self.arity
    }

    pub const fn counter(&self) -> Option<Counter> {
        self.counter
    }

    /// True if the length precedes the tag and covers the whole element.
    pub const fn is_header(&self) -> bool {
        self.header
    }

    pub const fn framing(&self) -> Framing {
        if self.header {
            return Framing::Header;
        }
        match (self.tag.is_some(), self.length.is_some()) {
            (false, false) => Framing::None,
            (true, false) => Framing::Tag,
            (false, true) => Framing::Length,
            (true, true) => Framing::TagLength,
        }
    }
}
