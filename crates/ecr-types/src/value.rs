use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::RecordId;
use crate::record::Record;

/// A literal scalar bound to a key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Num(serde_json::Number),
    Str(String),
}

impl Scalar {
    /// A floating-point scalar. Returns `None` for NaN and infinities,
    /// which have no JSON representation.
    pub fn float(value: f64) -> Option<Self> {
        serde_json::Number::from_f64(value).map(Self::Num)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Num(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Num(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The scalar as a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Num(n) => serde_json::Value::Number(n.clone()),
            Self::Str(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Num(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Num(value.into())
    }
}

/// The shape of a stored value, independent of its content.
///
/// The write policy is decided from this tag: link-shaped keys accumulate,
/// literal-shaped keys overwrite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Literal,
    SingleLink,
    MultiLink,
}

impl ValueKind {
    pub fn is_link(&self) -> bool {
        matches!(self, Self::SingleLink | Self::MultiLink)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal => write!(f, "literal"),
            Self::SingleLink => write!(f, "single link"),
            Self::MultiLink => write!(f, "multi link"),
        }
    }
}

/// A value bound to a key, tagged with its shape.
///
/// `Nested` only exists on the write path: storing a record normalizes every
/// nested record into its own stored record and replaces it with a `Link`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Literal(Scalar),
    Link(RecordId),
    /// Ordered links, most recently written first.
    Links(Vec<RecordId>),
    Nested(Box<Record>),
}

impl Value {
    pub fn literal(scalar: impl Into<Scalar>) -> Self {
        Self::Literal(scalar.into())
    }

    pub fn nested(record: Record) -> Self {
        Self::Nested(Box::new(record))
    }

    /// The shape tag. A nested record counts as a single link, which is what
    /// it becomes once stored.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Literal(_) => ValueKind::Literal,
            Self::Link(_) | Self::Nested(_) => ValueKind::SingleLink,
            Self::Links(_) => ValueKind::MultiLink,
        }
    }

    pub fn as_literal(&self) -> Option<&Scalar> {
        match self {
            Self::Literal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_link(&self) -> Option<&RecordId> {
        match self {
            Self::Link(id) => Some(id),
            _ => None,
        }
    }

    /// All ids referenced by this value, in stored order.
    pub fn links(&self) -> Vec<&RecordId> {
        match self {
            Self::Link(id) => vec![id],
            Self::Links(ids) => ids.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Combine the currently stored value with an incoming one.
    ///
    /// | current        | incoming  | result                 |
    /// |----------------|-----------|------------------------|
    /// | `Link(old)`    | `Link(n)` | `Links([n, old])`      |
    /// | `Links(olds)`  | `Link(n)` | `Links([n, ..olds])`   |
    /// | absent/literal | any       | incoming               |
    /// | link-shaped    | non-link  | `KindMismatch`         |
    pub fn accumulate(current: Option<&Value>, incoming: Value) -> Result<Value, TypeError> {
        match (current, incoming) {
            (Some(Value::Link(old)), Value::Link(new)) => Ok(Value::Links(vec![new, old.clone()])),
            (Some(Value::Links(olds)), Value::Link(new)) => {
                let mut ids = Vec::with_capacity(olds.len() + 1);
                ids.push(new);
                ids.extend(olds.iter().cloned());
                Ok(Value::Links(ids))
            }
            (Some(current @ (Value::Link(_) | Value::Links(_))), other) => {
                Err(TypeError::KindMismatch {
                    expected: current.kind(),
                    found: other.kind(),
                })
            }
            (_, incoming) => Ok(incoming),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::literal(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::literal(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::literal(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::literal(value)
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Self::Literal(value)
    }
}

impl From<RecordId> for Value {
    fn from(value: RecordId) -> Self {
        Self::Link(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Self::nested(value)
    }
}
