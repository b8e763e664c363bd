//! Decode policy configuration.

/// What to do when decode meets data the schema does not describe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Fail the transaction.
    #[default]
    Reject,
    /// Skip the data and continue.
    Ignore,
}

/// Configuration of a [crate::DecodeContext].
///
/// The default is strict: trailing bytes and unknown set tags are both rejected.
///
/// # Examples
///
/// ```
/// use wirefield_codec::{Config, Policy};
///
/// let cfg = Config {
///     unknown_tags: Policy::Ignore,
///     ..Config::default()
/// };
/// assert_eq!(cfg.trailing, Policy::Reject);
/// assert_eq!(Config::lenient().trailing, Policy::Ignore);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Config {
    /// Bytes left after the root message, or inside a length-framed value after it was decoded.
    pub trailing: Policy,

    /// Tags of a set that match no field.
    ///
    /// Unknown values can only be skipped when every field of the set carries the same length
    /// format; otherwise they are rejected regardless of this policy.
    pub unknown_tags: Policy,
}

impl Config {
    pub const fn strict() -> Self {
        Self {
            trailing: Policy::Reject,
            unknown_tags: Policy::Reject,
        }
    }

    pub const fn lenient() -> Self {
        Self {
            trailing: Policy::Ignore,
            unknown_tags: Policy::Ignore,
        }
    }
}
