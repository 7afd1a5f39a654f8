//! Copying records between repositories.

use ecr_types::{Record, RecordId, Scalar, TypeError, Value, ID_KEY};
use tracing::debug;

use crate::ec::Ec;
use crate::error::EcResult;
use crate::repository::Repository;
use crate::resolve::Resolved;

impl Repository {
    /// Write an expanded tree back as stored records.
    ///
    /// Every map becomes a record (keeping the id it carries, if any), every
    /// nested map a link to one, and every list a multi link. Returns the id of
    /// the root record.
    pub fn put_resolved(&self, tree: &Resolved) -> EcResult<RecordId> {
        let Resolved::Map(map) = tree else {
            return Err(TypeError::Wire("only maps can be stored as records".into()).into());
        };
        let mut record = Record::new();
        for (key, value) in map {
            match (key.as_str(), value) {
                (ID_KEY, Resolved::Literal(Scalar::Str(id))) => {
                    record.set_id(RecordId::new(id.as_str())?);
                }
                (_, Resolved::Literal(scalar)) => {
                    record.insert(key.clone(), Value::Literal(scalar.clone()));
                }
                (_, Resolved::Map(_)) => {
                    record.insert(key.clone(), Value::Link(self.put_resolved(value)?));
                }
                (_, Resolved::List(items)) => {
                    let ids = items
                        .iter()
                        .map(|item| self.put_resolved(item))
                        .collect::<EcResult<Vec<_>>>()?;
                    record.insert(key.clone(), Value::Links(ids));
                }
            }
        }
        self.put(record)
    }
}

impl Ec {
    /// Copy the snapshot of this record, and of everything it links to,
    /// into `target`. Returns the id of the copy.
    ///
    /// The copy keeps ids but is otherwise independent: later writes on
    /// either side do not reach the other. Inherited keys are flattened into
    /// the copied record itself.
    pub fn transfer(&self, target: &Repository) -> EcResult<RecordId> {
        let snapshot = self.snapshot()?;
        let id = target.put_resolved(&snapshot)?;
        debug!(source = %self.id(), copy = %id, "transferred record");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EcError;
    use serde_json::json;

    fn id(s: &str) -> RecordId {
        RecordId::new(s).unwrap()
    }

    fn building(repo: &Repository) -> Ec {
        let entity = Ec::new(repo, Record::with_id(id("Entity"))).unwrap();
        let mut b = entity.fork_with(Record::with_id(id("a_building"))).unwrap();
        b.declare_with("height", Some("ifc5:height"), Some("xsd:decimal"))
            .unwrap()
            .let_("height", 12)
            .unwrap();
        b
    }

    #[test]
    fn transfer_keeps_the_id_in_the_target() {
        let source = Repository::in_memory();
        let target = Repository::in_memory();
        let b = building(&source);
        assert!(target.get(&id("a_building")).unwrap().is_none());

        let copied = b.transfer(&target).unwrap();
        assert_eq!(copied, id("a_building"));
        let stored = target.get(&copied).unwrap().unwrap();
        assert_eq!(stored.id(), Some(&id("a_building")));
    }

    #[test]
    fn transferred_content_equals_source_snapshot() {
        let source = Repository::in_memory();
        let target = Repository::in_memory();
        let b = building(&source);
        let copied = b.transfer(&target).unwrap();
        let copy = target.load(&copied).unwrap().unwrap();
        assert_eq!(copy.snapshot().unwrap(), b.snapshot().unwrap());
    }

    #[test]
    fn copy_is_independent_of_later_source_writes() {
        let source = Repository::in_memory();
        let target = Repository::in_memory();
        let mut b = building(&source);
        let before = b.snapshot().unwrap();
        let copied = b.transfer(&target).unwrap();

        b.let_("height", 40).unwrap();
        let mut parent = b.parent().unwrap().unwrap();
        parent.let_("owner", "someone").unwrap();

        let copy = target.load(&copied).unwrap().unwrap();
        assert_eq!(copy.snapshot().unwrap(), before);
        assert_eq!(copy.get("height").unwrap().as_literal(), Some(&Scalar::from(12)));
    }

    #[test]
    fn inherited_keys_are_flattened_into_the_copy() {
        let source = Repository::in_memory();
        let target = Repository::in_memory();
        let parent = Ec::new(&source, Record::with_id(id("p")).with("color", "red")).unwrap();
        let child = parent.fork_with(Record::with_id(id("c"))).unwrap();
        child.transfer(&target).unwrap();

        let stored = target.get(&id("c")).unwrap().unwrap();
        assert_eq!(stored.get("color"), Some(&Value::literal("red")));
        assert_eq!(stored.parent(), Some(&id("p")));
        assert!(target.has_id(&id("p")).unwrap());
    }

    #[test]
    fn multi_links_survive_transfer() {
        let source = Repository::in_memory();
        let target = Repository::in_memory();
        let x = Ec::new(&source, Record::with_id(id("x"))).unwrap();
        let y = Ec::new(&source, Record::with_id(id("y"))).unwrap();
        let mut ec = Ec::new(&source, Record::with_id(id("tagged"))).unwrap();
        ec.let_("tags", &x).unwrap().let_("tags", &y).unwrap();
        ec.transfer(&target).unwrap();

        let stored = target.get(&id("tagged")).unwrap().unwrap();
        assert_eq!(stored.get("tags"), Some(&Value::Links(vec![id("y"), id("x")])));
    }

    #[test]
    fn transfer_of_cyclic_graph_fails_without_writing() {
        let source = Repository::in_memory();
        let target = Repository::in_memory();
        source.put(Record::with_id(id("a")).with("next", id("b"))).unwrap();
        source.put(Record::with_id(id("b")).with("next", id("a"))).unwrap();
        let a = source.load(&id("a")).unwrap().unwrap();
        assert!(matches!(a.transfer(&target), Err(EcError::CyclicReference { .. })));
        assert!(target.ids().unwrap().is_empty());
    }

    #[test]
    fn put_resolved_rejects_non_maps() {
        let repo = Repository::in_memory();
        let err = repo.put_resolved(&Resolved::Literal(Scalar::from(1))).unwrap_err();
        assert!(matches!(err, EcError::Type(TypeError::Wire(_))));
    }

    #[test]
    fn put_resolved_generates_ids_for_anonymous_maps() {
        let repo = Repository::in_memory();
        let tree = Resolved::Map([("n".to_string(), Resolved::Literal(Scalar::from(1)))].into());
        let new_id = repo.put_resolved(&tree).unwrap();
        let stored = repo.get(&new_id).unwrap().unwrap();
        assert_eq!(stored.to_json(), json!({"id": new_id.as_str(), "n": 1}));
    }
}
