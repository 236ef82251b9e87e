//! Property value types for graph nodes and relationships
//!
//! A closed tagged union with explicit comparison rules:
//! - `Null` never compares equal to anything, itself included, but is stored
//!   and persisted like any other value
//! - comparing two different kinds is a non-match, never an error

use super::types::PropertyId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Property value stored on nodes and relationships
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl PropertyValue {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Get text value if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get numeric value if this is a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get boolean value if this is a boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get type name as string
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Null => "Null",
            PropertyValue::Boolean(_) => "Boolean",
            PropertyValue::Number(_) => "Number",
            PropertyValue::Text(_) => "Text",
        }
    }

    /// Predicate equality.
    ///
    /// Returns `None` when either side is null (the comparison is unknown),
    /// `Some(false)` for values of different kinds.
    pub fn equals(&self, other: &PropertyValue) -> Option<bool> {
        match (self, other) {
            (PropertyValue::Null, _) | (_, PropertyValue::Null) => None,
            (PropertyValue::Boolean(a), PropertyValue::Boolean(b)) => Some(a == b),
            (PropertyValue::Number(a), PropertyValue::Number(b)) => Some(a == b),
            (PropertyValue::Text(a), PropertyValue::Text(b)) => Some(a == b),
            _ => Some(false),
        }
    }

    /// Predicate ordering; `None` for null operands, mismatched kinds and NaN.
    pub fn compare(&self, other: &PropertyValue) -> Option<Ordering> {
        match (self, other) {
            (PropertyValue::Boolean(a), PropertyValue::Boolean(b)) => Some(a.cmp(b)),
            (PropertyValue::Number(a), PropertyValue::Number(b)) => a.partial_cmp(b),
            (PropertyValue::Text(a), PropertyValue::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total order used by ORDER BY: booleans, then numbers, then text, nulls last.
    pub fn sort_cmp(&self, other: &PropertyValue) -> Ordering {
        fn rank(v: &PropertyValue) -> u8 {
            match v {
                PropertyValue::Boolean(_) => 0,
                PropertyValue::Number(_) => 1,
                PropertyValue::Text(_) => 2,
                PropertyValue::Null => 3,
            }
        }

        match (self, other) {
            (PropertyValue::Boolean(a), PropertyValue::Boolean(b)) => a.cmp(b),
            (PropertyValue::Number(a), PropertyValue::Number(b)) => a.total_cmp(b),
            (PropertyValue::Text(a), PropertyValue::Text(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }

    /// Render as a JSON value. Non-finite numbers become null.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            PropertyValue::Null => serde_json::Value::Null,
            PropertyValue::Boolean(b) => serde_json::Value::Bool(*b),
            PropertyValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            PropertyValue::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => write!(f, "null"),
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Number(n) => write!(f, "{}", n),
            PropertyValue::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        PropertyValue::Number(n as f64)
    }
}

impl From<i32> for PropertyValue {
    fn from(n: i32) -> Self {
        PropertyValue::Number(n as f64)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(PropertyValue::Null)
    }
}

/// Property list of a node or relationship, keyed by interned property id
pub type PropertyMap = BTreeMap<PropertyId, PropertyValue>;
