use ecr_types::{Record, RecordId, Value};
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Id-keyed store of flat records.
///
/// Implementations provide id minting, raw reads, and raw full-replace
/// writes of already-flat records. The provided methods build the rest of
/// the store contract on top of those:
/// - `put` assigns a missing id, checks reserved-key shapes, and stores every
///   nested record separately before the record that contains it.
/// - `create` stores an empty record under a fresh id.
///
/// The operations intentionally line up with HTTP verbs (`create` ~ POST,
/// `get` ~ GET, `put` ~ PUT) so an adapter can expose them directly.
pub trait RecordStore: Send + Sync {
    /// Mint a fresh id.
    fn new_id(&self) -> RecordId;

    /// Fetch a record by id.
    ///
    /// Returns `Ok(None)` if no record exists at `id`.
    fn get(&self, id: &RecordId) -> StoreResult<Option<Record>>;

    /// Store a flat record at its id, replacing any previous content.
    ///
    /// The record has an id and holds no nested records; callers go through
    /// [`RecordStore::put`], which guarantees both.
    fn replace(&self, record: Record) -> StoreResult<()>;

    /// Every stored id, sorted.
    fn ids(&self) -> StoreResult<Vec<RecordId>>;

    /// Check whether a record exists at `id`.
    fn has_id(&self, id: &RecordId) -> StoreResult<bool> {
        Ok(self.get(id)?.is_some())
    }

    /// Store an empty record under a fresh id and return the id.
    fn create(&self) -> StoreResult<RecordId> {
        let id = self.new_id();
        self.replace(Record::with_id(id.clone()))?;
        debug!(id = %id, "created record");
        Ok(id)
    }

    /// Store `record`, generating an id if it has none, and return the id.
    ///
    /// Nested records are stored first (recursively, each under its own id)
    /// and replaced by links to them. Every record in the tree is checked
    /// before anything is written, so a rejected `put` stores nothing.
    fn put(&self, mut record: Record) -> StoreResult<RecordId> {
        let id = assign_ids(self, &mut record);
        check_tree(&record)?;
        write_tree(self, record)?;
        debug!(id = %id, "put record");
        Ok(id)
    }
}

/// Give `record` and every record nested in it an id, returning the root's.
fn assign_ids<S: RecordStore + ?Sized>(store: &S, record: &mut Record) -> RecordId {
    for (_, value) in record.fields_mut() {
        if let Value::Nested(nested) = value {
            assign_ids(store, nested);
        }
    }
    match record.id() {
        Some(id) => id.clone(),
        None => {
            let id = store.new_id();
            record.set_id(id.clone());
            id
        }
    }
}

/// Shape-check `record` and every record nested in it.
fn check_tree(record: &Record) -> StoreResult<()> {
    let id = record.id().cloned().ok_or(StoreError::MissingId)?;
    record
        .check_shape()
        .map_err(|reason| StoreError::InvalidShape { id, reason })?;
    for (_, value) in record.fields() {
        if let Value::Nested(nested) = value {
            check_tree(nested)?;
        }
    }
    Ok(())
}

/// Store the nested records of `record`, then `record` itself with links
/// in their place.
fn write_tree<S: RecordStore + ?Sized>(store: &S, mut record: Record) -> StoreResult<()> {
    for (_, value) in record.fields_mut() {
        if let Value::Nested(nested) = value {
            let nested = std::mem::take(nested.as_mut());
            let nested_id = nested.id().cloned().ok_or(StoreError::MissingId)?;
            write_tree(store, nested)?;
            *value = Value::Link(nested_id);
        }
    }
    store.replace(record)
}
