//! Key declarations.
//!
//! A declaration gives a key its meaning: a URI and a value type, in the
//! style of a JSON-LD `@context` entry. Each record may link to its own
//! context record under `@context`; that record maps declared key names to
//! declaration records of the shape `{ "@id": <uri>, "@type": <type> }`.
//! Lookup scans the contexts of the whole parent chain, nearest first.

use ecr_types::{is_reserved, Record, RecordId, Value, CONTEXT_KEY};
use tracing::debug;

use crate::ec::{Ec, Fetched};
use crate::error::{EcError, EcResult};

/// Declaration key holding the semantic URI.
pub const URI_KEY: &str = "@id";
/// Declaration key holding the value type.
pub const TYPE_KEY: &str = "@type";
/// Value type of keys declared without a URI.
pub const VOCAB_TYPE: &str = "@vocab";
/// Value type of keys declared with a URI but no explicit type.
pub const ID_TYPE: &str = "@id";

/// The meaning of a key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// Id of the declaration record.
    pub id: RecordId,
    pub uri: String,
    pub value_type: String,
}

impl Declaration {
    fn to_record(&self) -> Record {
        Record::new()
            .with(URI_KEY, self.uri.as_str())
            .with(TYPE_KEY, self.value_type.as_str())
    }
}

impl TryFrom<&Ec> for Declaration {
    type Error = EcError;

    fn try_from(ec: &Ec) -> Result<Self, Self::Error> {
        let text = |key: &str| {
            ec.record()
                .get(key)
                .and_then(Value::as_literal)
                .and_then(|s| s.as_str())
                .map(String::from)
        };
        match (text(URI_KEY), text(TYPE_KEY)) {
            (Some(uri), Some(value_type)) => Ok(Self {
                id: ec.id().clone(),
                uri,
                value_type,
            }),
            _ => Err(EcError::NotAView {
                expected: "declaration",
                id: ec.id().clone(),
            }),
        }
    }
}

impl Ec {
    /// Declare `key` with default meaning: its own name as URI, type `@vocab`.
    pub fn declare(&mut self, key: &str) -> EcResult<&mut Self> {
        self.declare_with(key, None, None)
    }

    /// Register a declaration for `key` in this record's own context,
    /// creating the context if this record has none locally.
    ///
    /// Without a URI the key's own name is used and the type is `@vocab`
    /// (any given type is ignored). With a URI but no type, the type is `@id`.
    pub fn declare_with(
        &mut self,
        key: &str,
        uri: Option<&str>,
        value_type: Option<&str>,
    ) -> EcResult<&mut Self> {
        if is_reserved(key) {
            return Err(EcError::ReservedKey(key.to_string()));
        }
        let (uri, value_type) = match uri {
            None => (key, VOCAB_TYPE),
            Some(uri) => (uri, value_type.unwrap_or(ID_TYPE)),
        };
        let mut context = self.local_context()?;
        let declaration = Record::new()
            .with(URI_KEY, uri)
            .with(TYPE_KEY, value_type);
        context.update(Record::new().with(key, declaration))?;
        Ok(self)
    }

    /// The nearest declaration of `key`, scanning contexts from this record
    /// outward.
    pub fn declaration_of(&self, key: &str) -> EcResult<Option<Declaration>> {
        for context in self.get_all(CONTEXT_KEY)? {
            let Fetched::View(context) = context else {
                continue;
            };
            if !context.record().contains_key(key) {
                continue;
            }
            if let Fetched::View(declared) = context.get(key)? {
                return Ok(Some(Declaration::try_from(&declared)?));
            }
        }
        Ok(None)
    }

    /// Copy the nearest declaration of `key` into this record's own
    /// context, as a fresh declaration record this record owns.
    pub fn redeclare(&mut self, key: &str) -> EcResult<&mut Self> {
        let declaration = self
            .declaration_of(key)?
            .ok_or_else(|| EcError::MissingDeclaration(key.to_string()))?;
        let mut context = self.local_context()?;
        context.update(Record::new().with(key, declaration.to_record()))?;
        debug!(key, id = %self.id(), from = %declaration.id, "redeclared key");
        Ok(self)
    }

    /// This record's own context, created empty if it has none.
    fn local_context(&mut self) -> EcResult<Ec> {
        if self.record().context().is_none() {
            self.update(Record::new().with(CONTEXT_KEY, Record::new()))?;
        }
        match self.record().context() {
            Some(id) => self.repository().follow(CONTEXT_KEY, id),
            None => Err(EcError::UndefinedKey(CONTEXT_KEY.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Repository;

    fn repo() -> Repository {
        Repository::in_memory()
    }

    #[test]
    fn declare_defaults_to_vocab() {
        let mut ec = Ec::empty(&repo()).unwrap();
        ec.declare("size").unwrap();
        let d = ec.declaration_of("size").unwrap().unwrap();
        assert_eq!(d.uri, "size");
        assert_eq!(d.value_type, "@vocab");
    }

    #[test]
    fn declare_with_uri_defaults_type_to_id() {
        let mut ec = Ec::empty(&repo()).unwrap();
        ec.declare_with("decomposes", Some("ifc5:decomposes"), None).unwrap();
        let d = ec.declaration_of("decomposes").unwrap().unwrap();
        assert_eq!(d.uri, "ifc5:decomposes");
        assert_eq!(d.value_type, "@id");
    }

    #[test]
    fn declare_with_uri_and_type() {
        let mut ec = Ec::empty(&repo()).unwrap();
        ec.declare_with("color", Some("https://schema.org/color"), Some("xsd:string"))
            .unwrap();
        let d = ec.declaration_of("color").unwrap().unwrap();
        assert_eq!(d.uri, "https://schema.org/color");
        assert_eq!(d.value_type, "xsd:string");
    }

    #[test]
    fn type_without_uri_is_ignored() {
        let mut ec = Ec::empty(&repo()).unwrap();
        ec.declare_with("size", None, Some("xsd:string")).unwrap();
        assert_eq!(ec.declaration_of("size").unwrap().unwrap().value_type, "@vocab");
    }

    #[test]
    fn declarations_share_one_local_context() {
        let mut ec = Ec::empty(&repo()).unwrap();
        ec.declare("lat").unwrap().declare("lon").unwrap();
        let contexts = ec.get_all(CONTEXT_KEY).unwrap();
        assert_eq!(contexts.len(), 1);
        let context = contexts[0].as_view().unwrap();
        assert!(context.record().contains_key("lat"));
        assert!(context.record().contains_key("lon"));
    }

    #[test]
    fn reserved_keys_cannot_be_declared() {
        let mut ec = Ec::empty(&repo()).unwrap();
        for key in ["id", "*", "@context"] {
            assert!(matches!(ec.declare(key), Err(EcError::ReservedKey(_))));
        }
    }

    #[test]
    fn declaration_found_three_forks_up_is_returned_unchanged() {
        let repo = repo();
        let mut root = Ec::empty(&repo).unwrap();
        root.declare_with("k", Some("urn:k"), Some("xsd:int")).unwrap();
        let expected = root.declaration_of("k").unwrap().unwrap();

        let leaf = root.fork().unwrap().fork().unwrap().fork().unwrap();
        assert_eq!(leaf.declaration_of("k").unwrap(), Some(expected));
    }

    #[test]
    fn nearest_declaration_wins() {
        let repo = repo();
        let mut root = Ec::empty(&repo).unwrap();
        root.declare_with("k", Some("urn:root"), None).unwrap();
        let mut child = root.fork().unwrap();
        child.declare_with("k", Some("urn:child"), None).unwrap();
        assert_eq!(child.declaration_of("k").unwrap().unwrap().uri, "urn:child");
        assert_eq!(root.declaration_of("k").unwrap().unwrap().uri, "urn:root");
    }

    #[test]
    fn undeclared_key_has_no_declaration() {
        let ec = Ec::empty(&repo()).unwrap();
        assert!(ec.declaration_of("nothing").unwrap().is_none());
    }

    #[test]
    fn redeclare_copies_into_local_context() {
        let repo = repo();
        let mut root = Ec::empty(&repo).unwrap();
        root.declare_with("color", Some("https://schema.org/color"), Some("xsd:string"))
            .unwrap();
        let inherited = root.declaration_of("color").unwrap().unwrap();

        let mut child = root.fork().unwrap();
        assert!(child.record().context().is_none());
        child.redeclare("color").unwrap();

        let local = child.declaration_of("color").unwrap().unwrap();
        assert_eq!(local.uri, inherited.uri);
        assert_eq!(local.value_type, inherited.value_type);
        assert_ne!(local.id, inherited.id);
        assert_ne!(child.record().context(), root.record().context());
    }

    #[test]
    fn redeclare_without_any_declaration_fails() {
        let mut ec = Ec::empty(&repo()).unwrap().fork().unwrap();
        let err = ec.redeclare("ghost").unwrap_err();
        assert!(matches!(err, EcError::MissingDeclaration(k) if k == "ghost"));
    }
}
