//! Inheriting record views for ECR.
//!
//! An [`Ec`] ("Entity-Component") is a view over one stored record that
//! supports differential inheritance: a record names at most one parent
//! under `*`, and any key it does not bind itself is looked up along the
//! parent chain. Records can link to one another (singly or many-valued),
//! declare what their keys mean, be expanded into self-contained
//! [`Resolved`] snapshots, and be copied into another [`Repository`].
//!
//! # Quick Start
//!
//! ```rust
//! use ecr_core::{Ec, Record, Repository};
//!
//! let repo = Repository::in_memory();
//! let mut parent = Ec::new(&repo, Record::new()).unwrap();
//! parent.declare("color").unwrap().let_("color", "red").unwrap();
//!
//! let mut child = parent.fork().unwrap();
//! assert_eq!(child.get("color").unwrap().as_str(), Some("red"));
//!
//! child.let_("color", "green").unwrap();
//! assert_eq!(child.get("color").unwrap().as_str(), Some("green"));
//! assert_eq!(parent.get("color").unwrap().as_str(), Some("red"));
//! ```
//!
//! # Modules
//!
//! - [`repository`]: [`Repository`], a store plus its constructor table
//! - [`dispatch`]: ordered, first-match-wins view constructors
//! - [`ec`]: the view itself, with lookup and writes
//! - [`declare`]: key declarations in `@context`
//! - [`resolve`]: link expansion and snapshots
//! - [`transfer`]: copying snapshots between repositories
//! - [`views`]: typed views such as [`Component`]

pub mod config;
pub mod declare;
pub mod dispatch;
pub mod ec;
pub mod error;
pub mod repository;
pub mod resolve;
pub mod transfer;
pub mod views;

pub use config::EcConfig;
pub use declare::Declaration;
pub use dispatch::{
    ComponentConstructor, ConstructorTable, EcConstructor, PredicateConstructor, ViewConstructor,
    COMPONENT_KIND, EC_KIND,
};
pub use ec::{Ec, Fetched, LetValue};
pub use error::{EcError, EcResult};
pub use repository::Repository;
pub use resolve::Resolved;
pub use views::Component;

pub use ecr_store::{InMemoryRecordStore, RecordStore, StoreConfig};
pub use ecr_types::{Record, RecordId, Scalar, Value, ValueKind};
