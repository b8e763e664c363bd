//! Core codec traits.

use crate::{
    context::{DecodeContext, EncodeContext},
    instance::Slot,
    schema::{ChoiceSchema, Schema},
    Error,
};

/// Trait for values that can be encoded into an [EncodeContext] and decoded in place from a
/// [DecodeContext].
///
/// This is the seam for single-value (scalar) codecs as well as for nested containers. The
/// lifetime `'a` is that of the decode input and arena: decoded values may borrow from both.
pub trait Codec<'a> {
    /// Returns the encoded length of this value.
    ///
    /// This method MUST return the exact number of bytes that will be written by `write()`.
    fn len_encoded(&self) -> usize;

    /// Encodes this value at the current position of `ctx`.
    fn write(&self, ctx: &mut EncodeContext<'_>) -> Result<(), Error>;

    /// Decodes a value from the current (bounded) region of `ctx` into `self`.
    fn read(&mut self, ctx: &mut DecodeContext<'a>) -> Result<(), Error>;

    /// Interprets this value as an instance count, for fields used as [crate::Counter::Field].
    fn as_count(&self) -> Option<usize> {
        None
    }

    /// Builds a value holding `count`, written in place of an unset [crate::Counter::Field].
    fn from_count(_count: usize) -> Option<Self>
    where
        Self: Sized,
    {
        None
    }

    /// Name identifying this value in errors.
    fn name(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// A Sequence or Set: a fixed list of fields described by a [Schema].
///
/// Implementations MUST return one [Slot] per field of the schema, by index. [crate::impl_message]
/// generates both from a single field list.
pub trait Message<'a> {
    fn schema() -> &'static Schema
    where
        Self: Sized;

    fn field(&self, index: usize) -> &dyn Slot<'a>;

    fn field_mut(&mut self, index: usize) -> &mut dyn Slot<'a>;
}

/// A tagged union holding at most one active alternative.
///
/// Use [crate::impl_choice] to implement [Codec] for the type, or to generate the whole
/// implementation from a list of alternatives.
pub trait Choice<'a> {
    fn schema() -> &'static ChoiceSchema
    where
        Self: Sized;

    /// Returns the tag and value of the active alternative.
    fn selected(&self) -> Option<(u64, &dyn Codec<'a>)>;

    /// Replaces the active alternative with an empty instance of the one identified by `tag`.
    ///
    /// Returns `None` (leaving the current selection untouched) if `tag` is unknown.
    fn activate(&mut self, tag: u64) -> Option<&mut dyn Codec<'a>>;

    /// Activates the alternative identified by `tag`, failing with [Error::UnknownMessage]
    /// (at offset 0) if the schema does not declare it.
    fn select(&mut self, tag: u64) -> Result<&mut dyn Codec<'a>, Error>
    where
        Self: Sized,
    {
        crate::choice::select(self, tag, 0)
    }
}

/// Implements [Message] and [Codec] for a struct from its list of fields.
///
/// Each entry names a struct field holding a [crate::Slot], optionally followed by the
/// [crate::Field] builder calls describing it. The field name is also its name on the wire.
/// Entries are in wire order, and [crate::Counter::Field] refers to them by position.
///
/// ```ignore
/// impl_message!('a, Request<'a>, set "REQUEST", {
///     id: tagged(0x01, 1).length(Length::U8),
///     hops: tagged(0x02, 1).arity(Arity::up_to(4)),
/// });
/// ```
///
/// The layout is `sequence` or `set`, as in [crate::Schema::sequence] and [crate::Schema::set].
///
/// # Panics
///
/// The first use of the schema panics if it is invalid (see [crate::SchemaError]).
///
/// Without a field list, implements only [Codec], for a type with a hand-written [Message]
/// implementation:
///
/// ```ignore
/// impl_message!('a, Request<'a>);
/// ```
#[macro_export]
macro_rules! impl_message {
    ($lt:lifetime, $type:ty) => {
        impl<$lt> $crate::Codec<$lt> for $type {
            fn len_encoded(&self) -> usize {
                $crate::message::len_encoded(self)
            }

            fn write(&self, ctx: &mut $crate::EncodeContext<'_>) -> Result<(), $crate::Error> {
                $crate::message::write(self, ctx)
            }

            fn read(&mut self, ctx: &mut $crate::DecodeContext<$lt>) -> Result<(), $crate::Error> {
                $crate::message::read(self, ctx)
            }

            fn name(&self) -> &'static str {
                <Self as $crate::Message<$lt>>::schema().name()
            }
        }
    };
    (
        $lt:lifetime, $type:ty, $layout:ident $name:literal, {
            $($field:ident $(: $($method:ident ( $($args:tt)* )).+)?),+ $(,)?
        }
    ) => {
        const _: () = {
            #[allow(non_camel_case_types)]
            enum Index {
                $($field),+
            }

            const SLOTS: &[Index] = &[$(Index::$field),+];

            impl<$lt> $crate::Message<$lt> for $type {
                fn schema() -> &'static $crate::Schema {
                    static FIELDS: &[$crate::Field] = &[$(
                        $crate::Field::new(stringify!($field)) $($(.$method($($args)*))+)?
                    ),+];
                    static SCHEMA: ::std::sync::OnceLock<$crate::Schema> =
                        ::std::sync::OnceLock::new();
                    SCHEMA.get_or_init(|| {
                        $crate::Schema::$layout($name, FIELDS).unwrap_or_else(|err| panic!("{err}"))
                    })
                }

                fn field(&self, index: usize) -> &dyn $crate::Slot<$lt> {
                    match SLOTS.get(index) {
                        $(Some(Index::$field) => &self.$field,)+
                        None => unreachable!("{} has no field {index}", stringify!($type)),
                    }
                }

                fn field_mut(&mut self, index: usize) -> &mut dyn $crate::Slot<$lt> {
                    match SLOTS.get(index) {
                        $(Some(Index::$field) => &mut self.$field,)+
                        None => unreachable!("{} has no field {index}", stringify!($type)),
                    }
                }
            }
        };

        $crate::impl_message!($lt, $type);
    };
}

/// Implements [Choice] and [Codec] for an enum from its list of alternatives.
///
/// Each entry maps a discriminant to a tuple variant holding the alternative. Variants not
/// listed (typically an empty default) count as no selection.
///
/// ```ignore
/// impl_choice!('a, Proto<'a>, "PROTO", Width::U8, {
///     0x04 => Set,
///     0x14 => Mset,
/// });
/// ```
///
/// # Panics
///
/// The first use of the schema panics if it is invalid (see [crate::SchemaError]).
///
/// Without a list, implements only [Codec], for a type with a hand-written [Choice]
/// implementation:
///
/// ```ignore
/// impl_choice!('a, Proto<'a>);
/// ```
#[macro_export]
macro_rules! impl_choice {
    ($lt:lifetime, $type:ty) => {
        impl<$lt> $crate::Codec<$lt> for $type {
            fn len_encoded(&self) -> usize {
                $crate::choice::len_encoded(self)
            }

            fn write(&self, ctx: &mut $crate::EncodeContext<'_>) -> Result<(), $crate::Error> {
                $crate::choice::write(self, ctx)
            }

            fn read(&mut self, ctx: &mut $crate::DecodeContext<$lt>) -> Result<(), $crate::Error> {
                $crate::choice::read(self, ctx)
            }

            fn name(&self) -> &'static str {
                <Self as $crate::Choice<$lt>>::schema().name()
            }
        }
    };
    (
        $lt:lifetime, $type:ty, $name:literal, $width:expr, {
            $($tag:expr => $variant:ident),+ $(,)?
        }
    ) => {
        impl<$lt> $crate::Choice<$lt> for $type {
            fn schema() -> &'static $crate::ChoiceSchema {
                static ALTERNATIVES: &[$crate::Alternative] =
                    &[$($crate::Alternative::new($tag, stringify!($variant))),+];
                static SCHEMA: ::std::sync::OnceLock<$crate::ChoiceSchema> =
                    ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    $crate::ChoiceSchema::new($name, $width, ALTERNATIVES)
                        .unwrap_or_else(|err| panic!("{err}"))
                })
            }

            fn selected(&self) -> Option<(u64, &dyn $crate::Codec<$lt>)> {
                match self {
                    $(Self::$variant(value) => Some(($tag, value as &dyn $crate::Codec<$lt>)),)+
                    #[allow(unreachable_patterns)]
                    _ => None,
                }
            }

            fn activate(&mut self, tag: u64) -> Option<&mut dyn $crate::Codec<$lt>> {
                $(
                    if tag == $tag {
                        *self = Self::$variant(Default::default());
                        return match self {
                            Self::$variant(value) => Some(value as &mut dyn $crate::Codec<$lt>),
                            #[allow(unreachable_patterns)]
                            _ => None,
                        };
                    }
                )+
                None
            }
        }

        $crate::impl_choice!($lt, $type);
    };
}
