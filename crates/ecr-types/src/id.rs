use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Identity of a stored record.
///
/// Ids are opaque strings. Generated ids are UUIDs, but callers may supply
/// any non-empty string (for example `"Entity"` for a well-known root).
/// An id is assigned once when a record is first written and never changes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create an id from a caller-supplied string.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.is_empty() {
            return Err(TypeError::EmptyId);
        }
        Ok(Self(id))
    }

    /// A fresh random (v4) UUID id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// A fresh time-ordered (v7) UUID id.
    pub fn time_ordered() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short identifier (first 8 characters).
    pub fn short_id(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for RecordId {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for RecordId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_id_is_rejected() {
        assert_eq!(RecordId::new(""), Err(TypeError::EmptyId));
    }

    #[test]
    fn caller_supplied_id_is_kept_verbatim() {
        let id = RecordId::new("a_building").unwrap();
        assert_eq!(id.as_str(), "a_building");
        assert_eq!(id.to_string(), "a_building");
    }

    #[test]
    fn random_ids_are_unique() {
        assert_ne!(RecordId::random(), RecordId::random());
    }

    #[test]
    fn time_ordered_ids_parse_as_v7() {
        let id = RecordId::time_ordered();
        let parsed = uuid::Uuid::parse_str(id.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 7);
    }

    #[test]
    fn short_id_truncates_long_ids_only() {
        let id = RecordId::new("0123456789abcdef").unwrap();
        assert_eq!(id.short_id(), "01234567");
        let short = RecordId::new("e1").unwrap();
        assert_eq!(short.short_id(), "e1");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = RecordId::new("Component").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"Component\"");
    }
}
