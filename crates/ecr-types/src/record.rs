use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::id::RecordId;
use crate::value::{Value, ValueKind};

/// Record identity.
pub const ID_KEY: &str = "id";
/// Parent marker: at most one link to the record this one inherits from.
pub const PARENT_KEY: &str = "*";
/// Link to the record holding this record's key declarations.
pub const CONTEXT_KEY: &str = "@context";

/// Returns `true` for the keys callers must not repurpose.
pub fn is_reserved(key: &str) -> bool {
    matches!(key, ID_KEY | PARENT_KEY | CONTEXT_KEY)
}

/// A flat mapping from key to tagged [`Value`], plus an optional identity.
///
/// The `id` is held apart from the field map so it cannot be overwritten by
/// an ordinary binding. A record read back from a store always has an id; a
/// record about to be written may leave it unset and have one generated.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<RecordId>,
    #[serde(default)]
    fields: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record with no id.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record with the given id.
    pub fn with_id(id: RecordId) -> Self {
        Self {
            id: Some(id),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    pub fn set_id(&mut self, id: RecordId) {
        self.id = Some(id);
    }

    /// Bind `key` to `value`, returning the previous binding.
    ///
    /// Binding the `id` key this way is rejected when the record is stored;
    /// use [`Record::set_id`].
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// `true` if `key` is bound locally. The `id` key counts once assigned.
    pub fn contains_key(&self, key: &str) -> bool {
        if key == ID_KEY {
            return self.id.is_some();
        }
        self.fields.contains_key(key)
    }

    /// Field bindings, excluding the id.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn fields_mut(&mut self) -> impl Iterator<Item = (&String, &mut Value)> {
        self.fields.iter_mut()
    }

    /// All locally bound keys, including `id` once assigned.
    pub fn keys(&self) -> BTreeSet<String> {
        let mut keys: BTreeSet<String> = self.fields.keys().cloned().collect();
        if self.id.is_some() {
            keys.insert(ID_KEY.to_string());
        }
        keys
    }

    /// Number of field bindings, excluding the id.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The parent link, if this record inherits.
    pub fn parent(&self) -> Option<&RecordId> {
        self.fields.get(PARENT_KEY).and_then(Value::as_link)
    }

    /// The declaration-record link, if one is bound locally.
    pub fn context(&self) -> Option<&RecordId> {
        self.fields.get(CONTEXT_KEY).and_then(Value::as_link)
    }

    /// Shape of the locally stored value for `key`.
    pub fn kind_of(&self, key: &str) -> Option<ValueKind> {
        if key == ID_KEY {
            return self.id.as_ref().map(|_| ValueKind::Literal);
        }
        self.fields.get(key).map(Value::kind)
    }

    /// Shallow merge: every field of `overlay` replaces the field of the same
    /// name. The id is kept from `self` unless `self` has none.
    pub fn merged(&self, overlay: Record) -> Record {
        let mut out = self.clone();
        if out.id.is_none() {
            out.id = overlay.id;
        }
        out.fields.extend(overlay.fields);
        out
    }

    /// `true` if any field still holds a nested record.
    pub fn has_nested(&self) -> bool {
        self.fields.values().any(|v| matches!(v, Value::Nested(_)))
    }

    /// Check the reserved-key shape rules.
    ///
    /// Returns a human-readable reason for the first violation found.
    pub fn check_shape(&self) -> Result<(), String> {
        if self.fields.contains_key(ID_KEY) {
            return Err("`id` must be the record identity, not a field".into());
        }
        for key in [PARENT_KEY, CONTEXT_KEY] {
            match self.fields.get(key) {
                None | Some(Value::Link(_)) | Some(Value::Nested(_)) => {}
                Some(other) => {
                    return Err(format!("`{key}` must hold one link, found {}", other.kind()));
                }
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self {
            id: None,
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> RecordId {
        RecordId::new(s).unwrap()
    }

    #[test]
    fn keys_include_id_once_assigned() {
        let mut r = Record::new().with("color", "red");
        assert_eq!(r.keys().len(), 1);
        r.set_id(id("p"));
        let keys = r.keys();
        assert!(keys.contains("id"));
        assert!(keys.contains("color"));
        assert!(r.contains_key("id"));
    }

    #[test]
    fn parent_and_context_accessors() {
        let r = Record::new()
            .with(PARENT_KEY, id("p"))
            .with(CONTEXT_KEY, id("ctx"));
        assert_eq!(r.parent(), Some(&id("p")));
        assert_eq!(r.context(), Some(&id("ctx")));
    }

    #[test]
    fn merged_overlays_fields_and_keeps_id() {
        let base = Record::with_id(id("a")).with("x", 1).with("y", 2);
        let overlay = Record::with_id(id("b")).with("y", 3);
        let m = base.merged(overlay);
        assert_eq!(m.id(), Some(&id("a")));
        assert_eq!(m.get("x"), Some(&Value::literal(1)));
        assert_eq!(m.get("y"), Some(&Value::literal(3)));
    }

    #[test]
    fn shape_rejects_id_field() {
        let r = Record::new().with("id", "x");
        assert!(r.check_shape().is_err());
    }

    #[test]
    fn shape_rejects_multi_valued_parent() {
        let r = Record::new().with(PARENT_KEY, Value::Links(vec![id("a"), id("b")]));
        let reason = r.check_shape().unwrap_err();
        assert!(reason.contains("multi link"));
    }

    #[test]
    fn shape_rejects_literal_context() {
        let r = Record::new().with(CONTEXT_KEY, "not-a-link");
        assert!(r.check_shape().is_err());
    }

    #[test]
    fn shape_accepts_nested_parent_and_plain_fields() {
        let r = Record::new()
            .with(PARENT_KEY, Record::new())
            .with("tags", Value::Links(vec![id("t")]));
        assert!(r.check_shape().is_ok());
        assert!(r.has_nested());
    }

    #[test]
    fn kind_of_reports_stored_shape() {
        let r = Record::with_id(id("a"))
            .with("lit", "v")
            .with("one", id("x"))
            .with("many", Value::Links(vec![id("x"), id("y")]));
        assert_eq!(r.kind_of("lit"), Some(ValueKind::Literal));
        assert_eq!(r.kind_of("one"), Some(ValueKind::SingleLink));
        assert_eq!(r.kind_of("many"), Some(ValueKind::MultiLink));
        assert_eq!(r.kind_of("id"), Some(ValueKind::Literal));
        assert_eq!(r.kind_of("missing"), None);
    }
}
