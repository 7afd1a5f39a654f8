//! Deep resolution: expanding links into nested, self-contained trees.

use std::collections::{BTreeMap, HashSet};

use ecr_types::{RecordId, Scalar};
use serde::Serialize;
use serde_json::Value as Json;

use crate::ec::{fetch_local, Ec, Fetched};
use crate::error::{EcError, EcResult};

/// A fully expanded value: plain data with no links left in it.
///
/// A `Resolved` tree owns everything it holds and has no tie back to the
/// repository it was computed from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Resolved {
    Literal(Scalar),
    Map(BTreeMap<String, Resolved>),
    List(Vec<Resolved>),
}

impl Resolved {
    pub fn as_map(&self) -> Option<&BTreeMap<String, Resolved>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Resolved]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Scalar> {
        match self {
            Self::Literal(s) => Some(s),
            _ => None,
        }
    }

    /// Entry `key` of a map.
    pub fn get(&self, key: &str) -> Option<&Resolved> {
        self.as_map().and_then(|map| map.get(key))
    }

    pub fn to_json(&self) -> Json {
        match self {
            Self::Literal(s) => s.to_json(),
            Self::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::List(items) => Json::Array(items.iter().map(Resolved::to_json).collect()),
        }
    }
}

/// Expansion state: the ids on the current path from the root.
struct Expansion<'a> {
    excludes: &'a [&'a str],
    path: HashSet<RecordId>,
    limit: usize,
}

impl Expansion<'_> {
    fn value(&mut self, fetched: Fetched) -> EcResult<Resolved> {
        match fetched {
            Fetched::Literal(s) => Ok(Resolved::Literal(s)),
            Fetched::View(ec) => self.expand(&ec),
            Fetched::Views(ecs) => ecs
                .iter()
                .map(|ec| self.expand(ec))
                .collect::<EcResult<Vec<_>>>()
                .map(Resolved::List),
        }
    }

    /// Every locally bound key of `ec`, minus the excluded ones, expanded.
    fn expand(&mut self, ec: &Ec) -> EcResult<Resolved> {
        if !self.path.insert(ec.id().clone()) {
            return Err(EcError::CyclicReference { id: ec.id().clone() });
        }
        if self.path.len() > self.limit {
            return Err(EcError::DepthExceeded { limit: self.limit });
        }
        let mut map = BTreeMap::new();
        for key in ec.record().keys() {
            if self.excludes.iter().any(|excluded| *excluded == key) {
                continue;
            }
            let fetched = fetch_local(ec.repository(), ec.record(), &key)?;
            map.insert(key, self.value(fetched)?);
        }
        self.path.remove(ec.id());
        Ok(Resolved::Map(map))
    }
}

impl Ec {
    /// Look `key` up and, if it links to other records, expand them into
    /// nested maps, recursively.
    pub fn resolve(&self, key: &str) -> EcResult<Resolved> {
        self.resolve_excluding(key, &[])
    }

    /// Like [`Ec::resolve`], leaving the keys in `excludes` out of every
    /// expanded record.
    ///
    /// Linked records expand to their own bindings; inherited values of a
    /// linked record appear through its expanded `*` entry. A record that
    /// links back to one still being expanded fails with
    /// [`EcError::CyclicReference`]. Records reached along separate paths
    /// are expanded once per path.
    pub fn resolve_excluding(&self, key: &str, excludes: &[&str]) -> EcResult<Resolved> {
        let mut expansion = Expansion {
            excludes,
            path: HashSet::from([self.id().clone()]),
            limit: self.repository().config().max_depth,
        };
        let fetched = self.get(key)?;
        expansion.value(fetched)
    }

    /// Every key of the chain, resolved: the fully inherited, dereferenced
    /// state of this record as one map.
    pub fn snapshot(&self) -> EcResult<Resolved> {
        let mut map = BTreeMap::new();
        for key in self.keys(true)? {
            let value = self.resolve(&key)?;
            map.insert(key, value);
        }
        Ok(Resolved::Map(map))
    }
}
