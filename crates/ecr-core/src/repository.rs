use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use ecr_store::{InMemoryRecordStore, RecordStore, StoreConfig, StoreError};
use ecr_types::{Record, RecordId};
use serde_json::Value as Json;
use tracing::debug;

use crate::config::EcConfig;
use crate::dispatch::{ConstructorTable, ViewConstructor};
use crate::ec::Ec;
use crate::error::{EcError, EcResult};

struct Inner {
    store: Box<dyn RecordStore>,
    constructors: RwLock<ConstructorTable>,
    config: EcConfig,
}

/// A record store paired with the dispatch table that turns its raw
/// records into views.
///
/// `Repository` is a cheap, cloneable handle; every [`Ec`] holds one.
/// Clones share the same store and constructor table.
#[derive(Clone)]
pub struct Repository {
    inner: Arc<Inner>,
}

impl Repository {
    /// Wrap a store, dispatching every record to the catch-all view.
    pub fn new(store: impl RecordStore + 'static) -> Self {
        Self::with_parts(Box::new(store), ConstructorTable::new(), EcConfig::default())
    }

    pub fn with_parts(
        store: Box<dyn RecordStore>,
        constructors: ConstructorTable,
        config: EcConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                constructors: RwLock::new(constructors),
                config,
            }),
        }
    }

    /// An empty in-memory repository with the catch-all view only.
    pub fn in_memory() -> Self {
        Self::new(InMemoryRecordStore::new())
    }

    /// An empty in-memory repository with the built-in views registered.
    pub fn with_builtin_views(store: StoreConfig, config: EcConfig) -> Self {
        Self::with_parts(
            Box::new(InMemoryRecordStore::with_config(store)),
            ConstructorTable::with_builtin_views(),
            config,
        )
    }

    pub fn config(&self) -> &EcConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.inner.store.as_ref()
    }

    /// `true` if both handles share one store.
    pub fn same_as(&self, other: &Repository) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ---- Store operations ----

    pub fn new_id(&self) -> RecordId {
        self.inner.store.new_id()
    }

    pub fn has_id(&self, id: &RecordId) -> EcResult<bool> {
        Ok(self.inner.store.has_id(id)?)
    }

    pub fn create(&self) -> EcResult<RecordId> {
        Ok(self.inner.store.create()?)
    }

    pub fn get(&self, id: &RecordId) -> EcResult<Option<Record>> {
        Ok(self.inner.store.get(id)?)
    }

    pub fn put(&self, record: Record) -> EcResult<RecordId> {
        Ok(self.inner.store.put(record)?)
    }

    pub fn ids(&self) -> EcResult<Vec<RecordId>> {
        Ok(self.inner.store.ids()?)
    }

    // ---- Dispatch ----

    /// Register a constructor ahead of every constructor registered so far.
    pub fn add_constructor(&self, constructor: Box<dyn ViewConstructor>) -> EcResult<()> {
        let mut table = self
            .inner
            .constructors
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        table.add_constructor(constructor);
        Ok(())
    }

    /// Constructor names in evaluation order.
    pub fn constructor_names(&self) -> EcResult<Vec<String>> {
        let table = self
            .inner
            .constructors
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(table.names().into_iter().map(String::from).collect())
    }

    /// Wrap a stored record in the view chosen by the first constructor
    /// that accepts it.
    ///
    /// Only stored records have views, so `record` must carry an id.
    pub fn constructor_for(&self, record: Record) -> EcResult<Ec> {
        let id = record.id().cloned().ok_or(StoreError::MissingId)?;
        let kind = {
            let table = self
                .inner
                .constructors
                .read()
                .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
            table.kind_for(&record).to_string()
        };
        Ok(Ec::from_parts(self.clone(), id, record, kind))
    }

    /// Fetch and wrap the record at `id`.
    ///
    /// Returns `Ok(None)` if no record exists at `id`.
    pub fn load(&self, id: &RecordId) -> EcResult<Option<Ec>> {
        match self.get(id)? {
            Some(record) => Ok(Some(self.constructor_for(record)?)),
            None => Ok(None),
        }
    }

    /// Follow a link stored under `key`.
    pub(crate) fn follow(&self, key: &str, id: &RecordId) -> EcResult<Ec> {
        self.load(id)?.ok_or_else(|| EcError::DanglingReference {
            key: key.to_string(),
            id: id.clone(),
        })
    }

    // ---- Wire ----

    /// Store records given in the JSON wire shape and return their ids.
    ///
    /// A top-level array is imported element by element, so later records
    /// may link to earlier ones by id.
    pub fn import_json(&self, json: &Json) -> EcResult<Vec<RecordId>> {
        let items: Vec<&Json> = match json {
            Json::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            let known: HashSet<RecordId> = self.ids()?.into_iter().collect();
            let is_link = |s: &str| RecordId::new(s).is_ok_and(|id| known.contains(&id));
            let record = Record::from_json(item, &is_link)?;
            ids.push(self.put(record)?);
        }
        debug!(count = ids.len(), "imported records");
        Ok(ids)
    }

    /// Every stored record in the JSON wire shape, ordered by id.
    pub fn export_json(&self) -> EcResult<Json> {
        let mut out = Vec::new();
        for id in self.ids()? {
            if let Some(record) = self.get(&id)? {
                out.push(record.to_json());
            }
        }
        Ok(Json::Array(out))
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let constructors = self
            .inner
            .constructors
            .read()
            .map(|t| t.names().into_iter().map(String::from).collect::<Vec<_>>())
            .unwrap_or_default();
        f.debug_struct("Repository")
            .field("constructors", &constructors)
            .field("config", &self.inner.config)
            .finish()
    }
}
