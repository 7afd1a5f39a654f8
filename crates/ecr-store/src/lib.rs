//! Id-keyed record storage for ECR.
//!
//! A store holds flat records keyed by [`RecordId`]. It owns id generation
//! and normalizes nested records into separately stored records on write.
//! It never interprets inheritance or links; that is the job of `ecr-core`.
//!
//! # Storage Backends
//!
//! All backends implement the [`RecordStore`] trait:
//!
//! - [`InMemoryRecordStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. `get` of an unknown id is `Ok(None)`, never an error.
//! 2. `put` is a full replace at the record's id; writing identical content
//!    twice is observationally a no-op.
//! 3. Every stored record has exactly one id, assigned at most once.
//! 4. Reserved-key shapes (`*`, `@context`, `id`) are checked on every
//!    record before it is written.
//!
//! [`RecordId`]: ecr_types::RecordId

pub mod config;
pub mod error;
pub mod memory;
pub mod traits;

pub use config::{IdStrategy, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryRecordStore;
pub use traits::RecordStore;
