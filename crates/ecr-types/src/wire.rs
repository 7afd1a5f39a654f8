//! JSON wire shape for records.
//!
//! On the wire a record is a flat JSON object whose values are scalars,
//! reference-id strings, or arrays of reference-id strings. JSON has no way
//! to tell a reference from a string literal, so decoding takes a predicate
//! that answers whether a string names a known record.

use serde_json::{Map, Value as Json};

use crate::error::TypeError;
use crate::id::RecordId;
use crate::record::{Record, CONTEXT_KEY, ID_KEY, PARENT_KEY};
use crate::value::{Scalar, Value};

impl Record {
    /// Encode as a flat JSON object.
    ///
    /// Nested records (present only before a record is stored) are encoded
    /// inline as objects.
    pub fn to_json(&self) -> Json {
        let mut map = Map::new();
        if let Some(id) = self.id() {
            map.insert(ID_KEY.to_string(), Json::String(id.to_string()));
        }
        for (key, value) in self.fields() {
            map.insert(key.clone(), value_to_json(value));
        }
        Json::Object(map)
    }

    /// Decode a JSON object.
    ///
    /// Strings under `*` and `@context` are always links. Any other string is
    /// a link when `is_link` recognizes it, and a literal otherwise. Arrays
    /// must hold only strings and decode as multi links. Objects decode as
    /// nested records.
    pub fn from_json(json: &Json, is_link: &dyn Fn(&str) -> bool) -> Result<Self, TypeError> {
        let Json::Object(map) = json else {
            return Err(TypeError::Wire(format!("expected object, found {}", type_name(json))));
        };
        let mut record = Record::new();
        for (key, value) in map {
            if key == ID_KEY {
                let Json::String(s) = value else {
                    return Err(TypeError::Wire("`id` must be a string".into()));
                };
                record.set_id(RecordId::new(s.as_str())?);
                continue;
            }
            let reserved = key == PARENT_KEY || key == CONTEXT_KEY;
            record.insert(key.clone(), value_from_json(key, value, reserved, is_link)?);
        }
        Ok(record)
    }
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Literal(s) => s.to_json(),
        Value::Link(id) => Json::String(id.to_string()),
        Value::Links(ids) => {
            Json::Array(ids.iter().map(|id| Json::String(id.to_string())).collect())
        }
        Value::Nested(record) => record.to_json(),
    }
}

fn value_from_json(
    key: &str,
    json: &Json,
    reserved: bool,
    is_link: &dyn Fn(&str) -> bool,
) -> Result<Value, TypeError> {
    match json {
        Json::String(s) if reserved || is_link(s) => Ok(Value::Link(RecordId::new(s.as_str())?)),
        Json::String(s) => Ok(Value::Literal(Scalar::Str(s.clone()))),
        Json::Bool(b) => Ok(Value::Literal(Scalar::Bool(*b))),
        Json::Number(n) => Ok(Value::Literal(Scalar::Num(n.clone()))),
        Json::Object(_) => Ok(Value::nested(Record::from_json(json, is_link)?)),
        Json::Array(items) => {
            let ids = items
                .iter()
                .map(|item| match item {
                    Json::String(s) => RecordId::new(s.as_str()),
                    other => Err(TypeError::Wire(format!(
                        "`{key}`: link lists hold id strings, found {}",
                        type_name(other)
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Links(ids))
        }
        Json::Null => Err(TypeError::Wire(format!("`{key}`: null is not a value"))),
    }
}

fn type_name(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
