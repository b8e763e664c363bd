//! Schema construction and validation.
//!
//! A [Schema] binds a container name and layout to its ordered [Field] descriptors. It is
//! built once per message type, typically in a `static` [std::sync::OnceLock], and checks the
//! rules that span several fields (single descriptors validate themselves when constructed).
//! Set schemas also build the tag lookup table used during decode.

use crate::field::{Counter, Field, Length, Tag, Width};
use thiserror::Error;

/// Errors detected while building a schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("duplicate tag {tag:#x} in '{schema}'")]
    DuplicateTag { schema: &'static str, tag: u64 },
    #[error("field '{field}' of set '{schema}' has no tag")]
    UntaggedSetField {
        schema: &'static str,
        field: &'static str,
    },
    #[error("field '{field}' of set '{schema}' uses a different tag width")]
    MixedTagWidth {
        schema: &'static str,
        field: &'static str,
    },
    #[error("field '{field}' of '{schema}' has an invalid counter")]
    InvalidCounter {
        schema: &'static str,
        field: &'static str,
    },
    #[error("tag {tag:#x} does not fit the discriminant of '{schema}'")]
    TagTooWide { schema: &'static str, tag: u64 },
    #[error("'{schema}' declares no alternatives")]
    Empty { schema: &'static str },
    #[error("field '{field}' of set '{schema}' uses a different header framing")]
    MixedHeader {
        schema: &'static str,
        field: &'static str,
    },
}

/// How the fields of a message are laid out on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// Fields appear in declared order.
    Sequence,
    /// Fields appear in any order and are dispatched by tag.
    Set,
}

/// Validated field layout of one message type.
#[derive(Clone, Debug)]
pub struct Schema {
    name: &'static str,
    layout: Layout,
    fields: &'static [Field],
    tags: Vec<(u64, usize)>,
    tag_width: Option<Width>,
    skip_length: Option<Length>,
    header: Option<Length>,
}

impl Schema {
    /// Builds the schema of a sequence.
    ///
    /// A tag may only repeat once every earlier field with that tag is followed by a field that
    /// appears a fixed number of times. Otherwise the earlier field would consume the values of
    /// the later one.
    pub fn sequence(name: &'static str, fields: &'static [Field]) -> Result<Self, SchemaError> {
        let mut open: Vec<Tag> = Vec::new();
        for (index, field) in fields.iter().enumerate() {
            if let Some(Counter::Field(counter)) = field.counter() {
                let valid = counter < index && !fields[counter].arity_info().is_multi();
                if !valid {
                    return Err(SchemaError::InvalidCounter {
                        schema: name,
                        field: field.name(),
                    });
                }
            }
            let Some(tag) = field.tag_info() else {
                continue;
            };
            if open.contains(&tag) {
                return Err(SchemaError::DuplicateTag {
                    schema: name,
                    tag: tag.value(),
                });
            }
            let arity = field.arity_info();
            let fixed = match field.counter() {
                Some(Counter::Field(_)) => true,
                Some(Counter::Prefix(_)) => arity.is_mandatory(),
                None => arity.min() == arity.max(),
            };
            if fixed {
                open.clear();
            }
            // A matched multi field rejects one more value with its tag
            if !fixed || (field.counter().is_none() && arity.is_multi()) {
                open.push(tag);
            }
        }
        Ok(Self {
            name,
            layout: Layout::Sequence,
            fields,
            tags: Vec::new(),
            tag_width: None,
            skip_length: None,
            header: None,
        })
    }

    /// Builds the schema of a set and its tag dispatch table.
    pub fn set(name: &'static str, fields: &'static [Field]) -> Result<Self, SchemaError> {
        let mut tags = Vec::with_capacity(fields.len());
        let mut tag_width = None;
        for (index, field) in fields.iter().enumerate() {
            let Some(tag) = field.tag_info() else {
                return Err(SchemaError::UntaggedSetField {
                    schema: name,
                    field: field.name(),
                });
            };
            if *tag_width.get_or_insert(tag.width()) != tag.width() {
                return Err(SchemaError::MixedTagWidth {
                    schema: name,
                    field: field.name(),
                });
            }
            if let Some(Counter::Field(_)) = field.counter() {
                return Err(SchemaError::InvalidCounter {
                    schema: name,
                    field: field.name(),
                });
            }
            if header_of(field) != fields.first().and_then(header_of) {
                return Err(SchemaError::MixedHeader {
                    schema: name,
                    field: field.name(),
                });
            }
            tags.push((tag.value(), index));
        }
        tags.sort_unstable();
        if let Some(pair) = tags.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(SchemaError::DuplicateTag {
                schema: name,
                tag: pair[0].0,
            });
        }

        // Unknown tags can only be skipped if every value carries the same kind of length
        let first = fields.first().and_then(Field::length_info);
        let skip_length = first.filter(|length| {
            fields
                .iter()
                .all(|f| f.length_info() == Some(*length) && f.counter().is_none())
        });

        Ok(Self {
            name,
            layout: Layout::Set,
            fields,
            tags,
            tag_width,
            skip_length,
            header: fields.first().and_then(header_of),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn fields(&self) -> &'static [Field] {
        self.fields
    }

    /// Width of the tags of a set (`None` for sequences and empty sets).
    pub fn tag_width(&self) -> Option<Width> {
        self.tag_width
    }

    /// Length format shared by every field of a set, if any.
    pub fn skip_length(&self) -> Option<Length> {
        self.skip_length
    }

    /// Length format in front of the tag of every element of a header set.
    ///
    /// Unknown elements of a header set can always be skipped.
    pub fn header(&self) -> Option<Length> {
        self.header
    }

    /// Returns the index of the field identified by `tag`.
    pub fn lookup(&self, tag: u64) -> Option<usize> {
        self.tags
            .binary_search_by_key(&tag, |&(value, _)| value)
            .ok()
            .map(|position| self.tags[position].1)
    }
}

fn header_of(field: &Field) -> Option<Length> {
    field.length_info().filter(|_| field.is_header())
}

/// One alternative of a [crate::Choice].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Alternative {
    tag: u64,
    name: &'static str,
}

impl Alternative {
    pub const fn new(tag: u64, name: &'static str) -> Self {
        Self { tag, name }
    }

    pub const fn tag(&self) -> u64 {
        self.tag
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

/// Validated discriminant layout of one choice type.
#[derive(Clone, Debug)]
pub struct ChoiceSchema {
    name: &'static str,
    width: Width,
    alternatives: &'static [Alternative],
}

impl ChoiceSchema {
    pub fn new(
        name: &'static str,
        width: Width,
        alternatives: &'static [Alternative],
    ) -> Result<Self, SchemaError> {
        if alternatives.is_empty() {
            return Err(SchemaError::Empty { schema: name });
        }
        for (index, alternative) in alternatives.iter().enumerate() {
            if alternative.tag > width.max_value() {
                return Err(SchemaError::TagTooWide {
                    schema: name,
                    tag: alternative.tag,
                });
            }
            if alternatives[..index].iter().any(|a| a.tag == alternative.tag) {
                return Err(SchemaError::DuplicateTag {
                    schema: name,
                    tag: alternative.tag,
                });
            }
        }
        Ok(Self {
            name,
            width,
            alternatives,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn width(&self) -> Width {
        self.width
    }

    pub fn alternatives(&self) -> &'static [Alternative] {
        self.alternatives
    }

    /// Returns the alternative identified by `tag`.
    pub fn lookup(&self, tag: u64) -> Option<&'static Alternative> {
        self.alternatives.iter().find(|a| a.tag == tag)
    }
}
