use thiserror::Error;

use crate::value::ValueKind;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("record id must not be empty")]
    EmptyId,

    #[error("value kind mismatch: expected {expected}, found {found}")]
    KindMismatch { expected: ValueKind, found: ValueKind },

    #[error("wire format error: {0}")]
    Wire(String),
}
