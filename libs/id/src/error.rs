//! Error types for ID parsing and validation.

use thiserror::Error;

/// Errors that can occur when parsing or validating IDs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The ID string is empty.
    #[error("ID cannot be empty")]
    Empty,

    /// The ID is not a valid UUID.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    /// The nil UUID is never a valid resource identifier.
    #[error("nil UUID is not a valid {kind} ID")]
    Nil { kind: &'static str },
}

impl IdError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, IdError::Empty)
    }
}
