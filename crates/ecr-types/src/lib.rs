//! Foundation types for ECR (Entity-Component Records).
//!
//! This crate provides the value model shared by every other ECR crate: the
//! record identifier, the tagged value kinds a key can hold, the flat record
//! itself, and the JSON wire shape records are exchanged in.
//!
//! # Key Types
//!
//! - [`RecordId`]: Identity of a stored record (generated UUID or caller-supplied)
//! - [`Scalar`]: Literal string, number, or boolean
//! - [`Value`]: Tagged binding: literal, single link, multi link, or nested record
//! - [`ValueKind`]: The tag alone, used by the write policy
//! - [`Record`]: A flat key-value mapping with at most one `id`
//!
//! # Reserved Keys
//!
//! - [`ID_KEY`] (`id`): record identity, assigned once
//! - [`PARENT_KEY`] (`*`): at most one link to the parent record
//! - [`CONTEXT_KEY`] (`@context`): link to the declaration record

pub mod error;
pub mod id;
pub mod record;
pub mod value;
pub mod wire;

pub use error::TypeError;
pub use id::RecordId;
pub use record::{is_reserved, Record, CONTEXT_KEY, ID_KEY, PARENT_KEY};
pub use value::{Scalar, Value, ValueKind};
