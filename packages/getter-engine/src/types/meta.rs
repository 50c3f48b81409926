//! Semi-structured extra attributes attached to a record.
//!
//! Sources hand back whatever they know about an entity (visitor numbers,
//! addresses, phone numbers, lists of alternative urls). [`MetaValue`] is the
//! closed set of shapes that can take, and serializes to plain JSON so the
//! whole [`Meta`] map fits a single text column.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Open mapping of attribute name to value.
pub type Meta = BTreeMap<String, MetaValue>;

/// A single meta value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<MetaValue>),
    Map(BTreeMap<String, MetaValue>),
}

impl MetaValue {
    /// Text content, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MetaValue::Null)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Text(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Text(value)
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Integer(value)
    }
}

impl From<i32> for MetaValue {
    fn from(value: i32) -> Self {
        MetaValue::Integer(value.into())
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Float(value)
    }
}

impl<T: Into<MetaValue>> From<Option<T>> for MetaValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(MetaValue::Null)
    }
}

impl<T: Into<MetaValue>> From<Vec<T>> for MetaValue {
    fn from(value: Vec<T>) -> Self {
        MetaValue::List(value.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, MetaValue>> for MetaValue {
    fn from(value: BTreeMap<String, MetaValue>) -> Self {
        MetaValue::Map(value)
    }
}

/// Serialize a meta map to the JSON text stored alongside a record.
pub fn to_json(meta: &Meta) -> serde_json::Result<String> {
    serde_json::to_string(meta)
}

/// Parse the JSON text stored alongside a record.
pub fn from_json(raw: &str) -> serde_json::Result<Meta> {
    if raw.trim().is_empty() {
        return Ok(Meta::new());
    }
    serde_json::from_str(raw)
}
