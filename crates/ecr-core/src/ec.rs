//! The inheriting record view.
//!
//! An [`Ec`] wraps one stored record. Reads fall back along the parent chain
//! (`*`), links are dereferenced through the repository on every read, and
//! writes go straight back to the store. No object graph is cached: two
//! views of the same id are independent, and a view sees external writes
//! after [`Ec::reload`].

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use ecr_types::{Record, RecordId, Scalar, TypeError, Value, ValueKind, ID_KEY, PARENT_KEY};
use tracing::{trace, warn};

use crate::error::{EcError, EcResult};
use crate::repository::Repository;

/// The result of looking a key up.
#[derive(Clone, Debug)]
pub enum Fetched {
    Literal(Scalar),
    /// A single link, dereferenced.
    View(Ec),
    /// A multi link, dereferenced, most recently written first.
    Views(Vec<Ec>),
}

impl Fetched {
    pub fn as_literal(&self) -> Option<&Scalar> {
        match self {
            Self::Literal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_literal().and_then(Scalar::as_str)
    }

    pub fn as_view(&self) -> Option<&Ec> {
        match self {
            Self::View(ec) => Some(ec),
            _ => None,
        }
    }

    pub fn into_view(self) -> Option<Ec> {
        match self {
            Self::View(ec) => Some(ec),
            _ => None,
        }
    }

    /// Linked views as a list; a single link yields one view, a literal none.
    pub fn into_views(self) -> Vec<Ec> {
        match self {
            Self::Literal(_) => Vec::new(),
            Self::View(ec) => vec![ec],
            Self::Views(ecs) => ecs,
        }
    }

    /// Ids of the linked views, in order.
    pub fn ids(&self) -> Vec<&RecordId> {
        match self {
            Self::Literal(_) => Vec::new(),
            Self::View(ec) => vec![ec.id()],
            Self::Views(ecs) => ecs.iter().map(Ec::id).collect(),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Literal(_) => ValueKind::Literal,
            Self::View(_) => ValueKind::SingleLink,
            Self::Views(_) => ValueKind::MultiLink,
        }
    }
}

/// A value handed to [`Ec::let_`]: a literal, or another record to link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LetValue {
    Literal(Scalar),
    Link(RecordId),
}

impl From<&Ec> for LetValue {
    fn from(ec: &Ec) -> Self {
        Self::Link(ec.id().clone())
    }
}

impl From<Scalar> for LetValue {
    fn from(value: Scalar) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for LetValue {
    fn from(value: &str) -> Self {
        Self::Literal(value.into())
    }
}

impl From<String> for LetValue {
    fn from(value: String) -> Self {
        Self::Literal(value.into())
    }
}

impl From<i64> for LetValue {
    fn from(value: i64) -> Self {
        Self::Literal(value.into())
    }
}

impl From<bool> for LetValue {
    fn from(value: bool) -> Self {
        Self::Literal(value.into())
    }
}

/// A view over one stored record.
#[derive(Clone)]
pub struct Ec {
    repo: Repository,
    id: RecordId,
    record: Record,
    kind: String,
}

impl Ec {
    /// Store `record` (generating an id if it has none) and return a view
    /// of what the store now holds.
    pub fn new(repo: &Repository, record: Record) -> EcResult<Self> {
        let id = repo.put(record)?;
        let stored = repo.get(&id)?.ok_or_else(|| EcError::NotFound(id.clone()))?;
        repo.constructor_for(stored)
    }

    /// A view of a freshly created, empty record.
    pub fn empty(repo: &Repository) -> EcResult<Self> {
        Self::new(repo, Record::new())
    }

    /// A view of the existing record at `id`, or `None` if there is none.
    pub fn load(repo: &Repository, id: &RecordId) -> EcResult<Option<Self>> {
        repo.load(id)
    }

    pub(crate) fn from_parts(repo: Repository, id: RecordId, record: Record, kind: String) -> Self {
        Self {
            repo,
            id,
            record,
            kind,
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    /// Name of the constructor that produced this view.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The locally stored bindings.
    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn to_json(&self) -> serde_json::Value {
        self.record.to_json()
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Shape of the locally stored value for `key`.
    pub fn kind_of(&self, key: &str) -> Option<ValueKind> {
        self.record.kind_of(key)
    }

    pub fn has_parent(&self) -> bool {
        self.record.parent().is_some()
    }

    /// The record this one inherits from.
    pub fn parent(&self) -> EcResult<Option<Ec>> {
        match self.record.parent() {
            Some(id) => Ok(Some(self.repo.follow(PARENT_KEY, id)?)),
            None => Ok(None),
        }
    }

    /// Re-read this record from the store.
    pub fn reload(&mut self) -> EcResult<&mut Self> {
        self.record = self
            .repo
            .get(&self.id)?
            .ok_or_else(|| EcError::NotFound(self.id.clone()))?;
        Ok(self)
    }

    // ---- Reads ----

    /// This record followed by each ancestor, nearest first.
    pub(crate) fn ancestry(&self) -> Ancestry<'_> {
        Ancestry {
            repo: &self.repo,
            next: Some(Step::Record(self.record.clone())),
            visited: HashSet::new(),
        }
    }

    /// Look `key` up here, then in each ancestor in turn.
    ///
    /// Links are dereferenced into views; the `id` key is always a literal.
    /// Fails with [`EcError::UndefinedKey`] when nothing in the chain binds
    /// the key.
    pub fn get(&self, key: &str) -> EcResult<Fetched> {
        for record in self.ancestry() {
            let record = record?;
            if record.contains_key(key) {
                return fetch_local(&self.repo, &record, key);
            }
            trace!(key, id = ?record.id(), "not bound here, walking to parent");
        }
        Err(EcError::UndefinedKey(key.to_string()))
    }

    /// Every binding of `key` along the chain, nearest first.
    pub fn get_all(&self, key: &str) -> EcResult<Vec<Fetched>> {
        let mut found = Vec::new();
        for record in self.ancestry() {
            let record = record?;
            if record.contains_key(key) {
                found.push(fetch_local(&self.repo, &record, key)?);
            }
        }
        Ok(found)
    }

    /// Local keys, or with `recur` the union of keys across the whole chain.
    pub fn keys(&self, recur: bool) -> EcResult<BTreeSet<String>> {
        if !recur {
            return Ok(self.record.keys());
        }
        let mut keys = BTreeSet::new();
        for record in self.ancestry() {
            keys.extend(record?.keys());
        }
        Ok(keys)
    }

    // ---- Writes ----

    /// Shallow-merge `bindings` over this record and store the result.
    ///
    /// No declaration check is made. `bindings` may repeat this record's id
    /// but not name a different one.
    pub fn update(&mut self, bindings: Record) -> EcResult<&mut Self> {
        if bindings.id().is_some_and(|id| id != &self.id) {
            return Err(EcError::ImmutableId);
        }
        let merged = self.record.merged(bindings);
        self.repo.put(merged)?;
        self.reload()
    }

    /// Bind `key` to a literal or a link.
    ///
    /// Link-valued keys accumulate: linking a key that already holds one link
    /// turns it into a list, and further links are prepended, so the newest
    /// comes first. Literal-valued keys are overwritten. Writing a key no
    /// declaration covers logs a warning but still proceeds.
    #[doc(alias = "let")]
    pub fn let_(&mut self, key: &str, value: impl Into<LetValue>) -> EcResult<&mut Self> {
        if key == ID_KEY {
            return Err(EcError::ImmutableId);
        }
        if self.repo.config().warn_undeclared && self.declaration_of(key)?.is_none() {
            warn!(key, id = %self.id, "no declaration found for key; use declare() to define it");
        }
        let incoming = match value.into() {
            LetValue::Literal(s) => Value::Literal(s),
            LetValue::Link(id) => Value::Link(id),
        };
        let next = Value::accumulate(self.record.get(key), incoming).map_err(|e| match e {
            TypeError::KindMismatch { expected, found } => EcError::KindMismatch {
                key: key.to_string(),
                expected,
                found,
            },
            other => EcError::Type(other),
        })?;
        self.update(Record::new().with(key, next))
    }

    /// A new record inheriting from this one.
    pub fn fork(&self) -> EcResult<Ec> {
        self.fork_with(Record::new())
    }

    /// A new record inheriting from this one, starting from `bindings`.
    pub fn fork_with(&self, mut bindings: Record) -> EcResult<Ec> {
        bindings.insert(PARENT_KEY, Value::Link(self.id.clone()));
        Ec::new(&self.repo, bindings)
    }
}

impl fmt::Debug for Ec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ec")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("record", &self.record)
            .finish()
    }
}

impl fmt::Display for Ec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string_pretty(&self.to_json()).map_err(|_| fmt::Error)?;
        write!(f, "{}({})", self.kind, json)
    }
}

/// Resolve a key bound locally in `record`.
pub(crate) fn fetch_local(repo: &Repository, record: &Record, key: &str) -> EcResult<Fetched> {
    if key == ID_KEY {
        if let Some(id) = record.id() {
            return Ok(Fetched::Literal(Scalar::Str(id.to_string())));
        }
    }
    match record.get(key) {
        Some(Value::Literal(s)) => Ok(Fetched::Literal(s.clone())),
        Some(Value::Link(id)) => Ok(Fetched::View(repo.follow(key, id)?)),
        Some(Value::Links(ids)) => {
            let views = ids
                .iter()
                .map(|id| repo.follow(key, id))
                .collect::<EcResult<Vec<_>>>()?;
            Ok(Fetched::Views(views))
        }
        Some(Value::Nested(_)) => Err(EcError::Unnormalized(key.to_string())),
        None => Err(EcError::UndefinedKey(key.to_string())),
    }
}

enum Step {
    Record(Record),
    Id(RecordId),
}

/// Iterator over a record and its ancestors.
///
/// Chains of any length are walked. Revisiting an id yields
/// [`EcError::CyclicReference`], and iteration ends after the first error.
pub(crate) struct Ancestry<'a> {
    repo: &'a Repository,
    next: Option<Step>,
    visited: HashSet<RecordId>,
}

impl Iterator for Ancestry<'_> {
    type Item = EcResult<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.next.take()? {
            Step::Record(record) => record,
            Step::Id(id) => {
                if self.visited.contains(&id) {
                    return Some(Err(EcError::CyclicReference { id }));
                }
                match self.repo.get(&id) {
                    Ok(Some(record)) => record,
                    Ok(None) => {
                        return Some(Err(EcError::DanglingReference {
                            key: PARENT_KEY.to_string(),
                            id,
                        }))
                    }
                    Err(e) => return Some(Err(e)),
                }
            }
        };
        if let Some(id) = record.id() {
            self.visited.insert(id.clone());
        }
        self.next = record.parent().cloned().map(Step::Id);
        Some(Ok(record))
    }
}
