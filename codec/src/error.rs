//! Error types for codec operations

use thiserror::Error;

/// Error type for encode, decode and arena operations.
///
/// Every variant that concerns a field carries the field (or container) name and the byte
/// offset at which the violation was detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("missing field '{field}' at offset {offset}: at least {expected} expected, got {got}")]
    MissingField {
        field: &'static str,
        expected: usize,
        got: usize,
        offset: usize,
    },
    #[error("excessive field '{field}' at offset {offset}: no more than {expected} expected, got {got}")]
    ExcessField {
        field: &'static str,
        expected: usize,
        got: usize,
        offset: usize,
    },
    #[error("unknown tag {tag:#x} in '{container}' at offset {offset}")]
    ExtraField {
        container: &'static str,
        tag: u64,
        offset: usize,
    },
    #[error("unknown message {tag:#x} in '{choice}' at offset {offset}")]
    UnknownMessage {
        choice: &'static str,
        tag: u64,
        offset: usize,
    },
    #[error("no alternative selected in '{choice}' at offset {offset}")]
    MissingSelection { choice: &'static str, offset: usize },
    #[error("no space to allocate '{type_name}': {size} octets")]
    OutOfMemory { type_name: &'static str, size: usize },
    #[error("truncated '{field}' at offset {offset}: needs {needed} octets, {remaining} left")]
    TruncatedData {
        field: &'static str,
        needed: usize,
        remaining: usize,
        offset: usize,
    },
    #[error("invalid value of '{field}' = {value:#x} at offset {offset}")]
    InvalidValue {
        field: &'static str,
        value: u64,
        offset: usize,
    },
    #[error("invalid length of '{field}' = {length} at offset {offset}")]
    InvalidLength {
        field: &'static str,
        length: usize,
        offset: usize,
    },
    #[error("no room for '{field}' at offset {offset}: needs {needed} octets, {remaining} left")]
    Overflow {
        field: &'static str,
        needed: usize,
        remaining: usize,
        offset: usize,
    },
    #[error("extra data in '{field}' at offset {offset}: {remaining} bytes")]
    ExtraData {
        field: &'static str,
        remaining: usize,
        offset: usize,
    },
}

/// The failure class of an [Error], without its details.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    MissingField,
    ExcessField,
    ExtraField,
    UnknownMessage,
    MissingSelection,
    OutOfMemory,
    TruncatedData,
    InvalidValue,
    InvalidLength,
    Overflow,
    ExtraData,
}

impl Error {
    /// Returns the failure class.
    pub fn kind(&self) -> Kind {
        match self {
            Error::MissingField { .. } => Kind::MissingField,
            Error::ExcessField { .. } => Kind::ExcessField,
            Error::ExtraField { .. } => Kind::ExtraField,
            Error::UnknownMessage { .. } => Kind::UnknownMessage,
            Error::MissingSelection { .. } => Kind::MissingSelection,
            Error::OutOfMemory { .. } => Kind::OutOfMemory,
            Error::TruncatedData { .. } => Kind::TruncatedData,
            Error::InvalidValue { .. } => Kind::InvalidValue,
            Error::InvalidLength { .. } => Kind::InvalidLength,
            Error::Overflow { .. } => Kind::Overflow,
            Error::ExtraData { .. } => Kind::ExtraData,
        }
    }

    /// Returns the name of the offending field, container or type.
    pub fn field(&self) -> &'static str {
        match self {
            Error::MissingField { field, .. }
            | Error::ExcessField { field, .. }
            | Error::TruncatedData { field, .. }
            | Error::InvalidValue { field, .. }
            | Error::InvalidLength { field, .. }
            | Error::Overflow { field, .. }
            | Error::ExtraData { field, .. } => field,
            Error::ExtraField { container, .. } => container,
            Error::UnknownMessage { choice, .. } | Error::MissingSelection { choice, .. } => choice,
            Error::OutOfMemory { type_name, .. } => type_name,
        }
    }

    /// Returns the byte offset of the failure, if it happened on the wire.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::MissingField { offset, .. }
            | Error::ExcessField { offset, .. }
            | Error::ExtraField { offset, .. }
            | Error::UnknownMessage { offset, .. }
            | Error::MissingSelection { offset, .. }
            | Error::TruncatedData { offset, .. }
            | Error::InvalidValue { offset, .. }
            | Error::InvalidLength { offset, .. }
            | Error::Overflow { offset, .. }
            | Error::ExtraData { offset, .. } => Some(*offset),
            Error::OutOfMemory { .. } => None,
        }
    }
}

/// Per-transaction error state.
///
/// Holds the first error of a transaction. Once set, it stays until [ErrorContext::reset].
#[derive(Clone, Debug, Default)]
pub struct ErrorContext {
    error: Option<Error>,
}

impl ErrorContext {
    /// Returns the recorded error, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Returns true if no error has been recorded.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Records `error` unless an earlier one is already present and returns the recorded error.
    pub fn record(&mut self, error: Error) -> Error {
        self.error.get_or_insert(error).clone()
    }

    /// Clears the recorded error.
    pub fn reset(&mut self) {
        self.error = None;
    }
}
