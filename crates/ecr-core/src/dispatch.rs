//! Constructor dispatch: deciding which view kind wraps a raw record.
//!
//! A [`ConstructorTable`] is an ordered list of [`ViewConstructor`]s
//! evaluated first-match-wins. The table always ends in the catch-all
//! [`EcConstructor`], so every record gets a view.

use ecr_types::Record;

/// Kind name of the catch-all view.
pub const EC_KIND: &str = "ec";
/// Kind name of records that describe another record.
pub const COMPONENT_KIND: &str = "component";
/// The key whose presence makes a record a component.
pub const DESCRIBES_KEY: &str = "describes";

/// One entry in the dispatch table.
///
/// The trait is object-safe and `Send + Sync` so constructors can be stored
/// in a `Vec<Box<dyn ViewConstructor>>`.
pub trait ViewConstructor: Send + Sync {
    /// Kind name given to views this constructor accepts.
    fn name(&self) -> &str;

    /// Whether this constructor accepts the record.
    fn can_parse(&self, record: &Record) -> bool;
}

/// Accepts every record.
pub struct EcConstructor;

impl ViewConstructor for EcConstructor {
    fn name(&self) -> &str {
        EC_KIND
    }

    fn can_parse(&self, _record: &Record) -> bool {
        true
    }
}

/// Accepts records that bind [`DESCRIBES_KEY`].
pub struct ComponentConstructor;

impl ViewConstructor for ComponentConstructor {
    fn name(&self) -> &str {
        COMPONENT_KIND
    }

    fn can_parse(&self, record: &Record) -> bool {
        record.contains_key(DESCRIBES_KEY)
    }
}

type Predicate = Box<dyn Fn(&Record) -> bool + Send + Sync>;

/// A constructor built from a name and a closure.
pub struct PredicateConstructor {
    name: String,
    predicate: Predicate,
}

impl PredicateConstructor {
    pub fn new(
        name: impl Into<String>,
        predicate: impl Fn(&Record) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
        }
    }
}

impl ViewConstructor for PredicateConstructor {
    fn name(&self) -> &str {
        &self.name
    }

    fn can_parse(&self, record: &Record) -> bool {
        (self.predicate)(record)
    }
}

/// Ordered, first-match-wins list of view constructors.
pub struct ConstructorTable {
    constructors: Vec<Box<dyn ViewConstructor>>,
}

impl ConstructorTable {
    /// A table holding only the catch-all constructor.
    pub fn new() -> Self {
        Self {
            constructors: vec![Box::new(EcConstructor)],
        }
    }

    /// `component` ahead of the catch-all.
    pub fn with_builtin_views() -> Self {
        let mut table = Self::new();
        table.add_constructor(Box::new(ComponentConstructor));
        table
    }

    /// Insert a constructor at the front, ahead of everything registered so far.
    pub fn add_constructor(&mut self, constructor: Box<dyn ViewConstructor>) {
        self.constructors.insert(0, constructor);
    }

    /// Kind name of the first constructor that accepts `record`.
    pub fn kind_for(&self, record: &Record) -> &str {
        self.constructors
            .iter()
            .find(|c| c.can_parse(record))
            .map(|c| c.name())
            .unwrap_or(EC_KIND)
    }

    /// Constructor names in evaluation order.
    pub fn names(&self) -> Vec<&str> {
        self.constructors.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl Default for ConstructorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConstructorTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
