use std::collections::HashMap;
use std::sync::RwLock;

use ecr_types::{Record, RecordId};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::traits::RecordStore;

/// In-memory, HashMap-based record store.
///
/// Intended for tests, embedding, and single-process use. Nothing survives
/// the process. The table sits behind a `RwLock` so the store is `Sync`, but
/// no read-modify-write atomicity is offered: callers issuing `get`+`put`
/// pairs must serialize them themselves.
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<RecordId, Record>>,
    config: StoreConfig,
}

impl InMemoryRecordStore {
    /// Create a new empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.records.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.records.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn new_id(&self) -> RecordId {
        self.config.id_strategy.generate()
    }

    fn get(&self, id: &RecordId) -> StoreResult<Option<Record>> {
        let map = self
            .records
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(map.get(id).cloned())
    }

    fn replace(&self, record: Record) -> StoreResult<()> {
        let Some(id) = record.id().cloned() else {
            return Err(StoreError::MissingId);
        };
        let mut map = self
            .records
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        map.insert(id, record);
        Ok(())
    }

    fn ids(&self) -> StoreResult<Vec<RecordId>> {
        let map = self
            .records
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        let mut ids: Vec<RecordId> = map.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn has_id(&self, id: &RecordId) -> StoreResult<bool> {
        let map = self
            .records
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(map.contains_key(id))
    }
}

impl std::fmt::Debug for InMemoryRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRecordStore")
            .field("record_count", &self.records.read().map(|map| map.len()).ok())
            .field("id_strategy", &self.config.id_strategy)
            .finish()
    }
}
