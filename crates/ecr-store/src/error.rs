use ecr_types::{RecordId, TypeError};

/// Errors from record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A record violates the reserved-key shape rules.
    #[error("invalid record {id}: {reason}")]
    InvalidShape { id: RecordId, reason: String },

    /// A raw write was attempted with a record that has no id.
    #[error("record has no id")]
    MissingId,

    /// The backing table's lock was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    LockPoisoned(String),

    /// A value could not be constructed or decoded.
    #[error("type error: {0}")]
    Type(#[from] TypeError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
