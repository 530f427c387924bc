use std::fmt::Display;

use serde::{Serialize, Serializer};
use serde_json::Value;

use super::time::DateTime;

/// Loosely typed scalar as found in query results, query parameters and stored fields
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Text(String),
    Timestamp(DateTime),
    Null,
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Integer(i) => Some(*i as f64),
            ScalarValue::Float(f) => Some(*f),
            ScalarValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => ScalarValue::Null,
            Value::Bool(b) => ScalarValue::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ScalarValue::Integer(i),
                None => n.as_f64().map(ScalarValue::Float).unwrap_or(ScalarValue::Null),
            },
            Value::String(s) => ScalarValue::Text(s.clone()),
            other => ScalarValue::Text(other.to_string()),
        }
    }
}

/// Numbers and booleans stay typed, timestamps become ISO-8601 instants, non-finite floats fall
/// back to their textual form.
impl Serialize for ScalarValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ScalarValue::Integer(i) => serializer.serialize_i64(*i),
            ScalarValue::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            ScalarValue::Float(f) => serializer.serialize_str(&f.to_string()),
            ScalarValue::Boolean(b) => serializer.serialize_bool(*b),
            ScalarValue::Text(s) => serializer.serialize_str(s),
            ScalarValue::Timestamp(dt) => serializer.serialize_str(&dt.to_iso_string()),
            ScalarValue::Null => serializer.serialize_none(),
        }
    }
}

impl Display for ScalarValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarValue::Integer(i) => write!(f, "{}", i),
            ScalarValue::Float(v) => write!(f, "{}", v),
            ScalarValue::Boolean(b) => write!(f, "{}", b),
            ScalarValue::Text(s) => write!(f, "{}", s),
            ScalarValue::Timestamp(dt) => write!(f, "{}", dt.to_iso_string()),
            ScalarValue::Null => Ok(()),
        }
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Integer(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Integer(value.into())
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float(value)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Boolean(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_owned())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}

impl From<DateTime> for ScalarValue {
    fn from(value: DateTime) -> Self {
        ScalarValue::Timestamp(value)
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ScalarValue::Null)
    }
}
