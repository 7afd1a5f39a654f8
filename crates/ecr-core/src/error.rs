use ecr_types::{RecordId, TypeError, ValueKind};
use thiserror::Error;

/// Errors raised by record views.
#[derive(Debug, Error)]
pub enum EcError {
    /// The key is bound neither locally nor anywhere up the parent chain.
    #[error("{0} is not defined")]
    UndefinedKey(String),

    /// No record in the chain declares the key.
    #[error("declaration of {0} not found; use declare()")]
    MissingDeclaration(String),

    /// The parent chain or a link graph loops back onto itself.
    #[error("cyclic reference through record {id}")]
    CyclicReference { id: RecordId },

    /// A chain walk or expansion went deeper than the configured limit.
    #[error("expansion exceeded the depth limit of {limit}")]
    DepthExceeded { limit: usize },

    /// A stored link points at a record that does not exist.
    #[error("{key} links to missing record {id}")]
    DanglingReference { key: String, id: RecordId },

    /// A stored record still holds a nested record under `key`.
    #[error("{0} holds a nested record that was never stored")]
    Unnormalized(String),

    /// The key is reserved and cannot be used this way.
    #[error("{0} is a reserved key")]
    ReservedKey(String),

    /// An attempt was made to change a record's id.
    #[error("record ids are immutable")]
    ImmutableId,

    /// A write would change the shape of a link-valued key.
    #[error("{key}: expected {expected}, found {found}")]
    KindMismatch {
        key: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// The record was not constructed as the requested view kind.
    #[error("record {id} is not a {expected}")]
    NotAView { expected: &'static str, id: RecordId },

    /// A record vanished between write and read-back.
    #[error("record not found: {0}")]
    NotFound(RecordId),

    #[error("store error: {0}")]
    Store(#[from] ecr_store::StoreError),

    #[error("type error: {0}")]
    Type(#[from] TypeError),
}

pub type EcResult<T> = Result<T, EcError>;
