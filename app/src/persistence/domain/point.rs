use std::{collections::BTreeMap, fmt::Display};

use crate::core::{item::State, time::DateTime};

/// Name of the single field every point carries
pub const FIELD_VALUE_NAME: &str = "value";

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
}

impl FieldValue {
    /// Storable representation of a state. Undefined states and non-finite numbers have none.
    pub fn from_state(state: &State) -> Option<FieldValue> {
        use crate::core::item::{OnOff, OpenClosed};

        match state {
            State::Integer(i) => Some(FieldValue::Integer(*i)),
            State::Decimal(d) | State::Percent(d) => Self::from_number(*d),
            State::OnOff(OnOff::On) | State::OpenClosed(OpenClosed::Open) => Some(FieldValue::Integer(1)),
            State::OnOff(OnOff::Off) | State::OpenClosed(OpenClosed::Closed) => Some(FieldValue::Integer(0)),
            State::DateTime(dt) => Some(FieldValue::Integer(dt.millis())),
            State::Text(s) => Some(FieldValue::Text(s.clone())),
            State::Hsb { .. } | State::Point { .. } => Some(FieldValue::Text(state.to_string())),
            State::Undefined(_) => None,
        }
    }

    fn from_number(value: f64) -> Option<FieldValue> {
        if !value.is_finite() {
            return None;
        }

        if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            Some(FieldValue::Integer(value as i64))
        } else {
            Some(FieldValue::Float(value))
        }
    }

    /// Literal usable in a Flux comparison
    pub fn to_flux_literal(&self) -> String {
        match self {
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Float(f) => format!("{:?}", f),
            FieldValue::Boolean(b) => b.to_string(),
            FieldValue::Text(s) => format!("\"{}\"", escape_string(s)),
        }
    }
}

/// Line protocol field value: integers carry the `i` suffix, strings are quoted
impl Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Integer(i) => write!(f, "{}i", i),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Text(s) => write!(f, "\"{}\"", escape_string(s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoragePoint {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub value: FieldValue,
    pub timestamp: DateTime,
}

impl StoragePoint {
    pub fn new(measurement: impl Into<String>, value: FieldValue, timestamp: DateTime) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            value,
            timestamp,
        }
    }

    pub fn add_tag(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(name.into(), value.into());
    }

    pub fn to_line_protocol(&self) -> String {
        self.to_string()
    }
}

/// `measurement[,tag=value...] value=<field> <millis>`
impl Display for StoragePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", escape_measurement(&self.measurement))?;

        for (name, value) in self.tags.iter().filter(|(n, v)| !n.is_empty() && !v.is_empty()) {
            write!(f, ",{}={}", escape_key(name), escape_key(value))?;
        }

        write!(f, " {}={} {}", FIELD_VALUE_NAME, self.value, self.timestamp.millis())
    }
}

fn escape_measurement(value: &str) -> String {
    escape(&without_line_breaks(value), &[',', ' '])
}

fn escape_key(value: &str) -> String {
    escape(&without_line_breaks(value), &[',', '=', ' '])
}

/// Line breaks end a point, they can't be escaped outside of string fields
fn without_line_breaks(value: &str) -> String {
    value.replace(|c: char| c == '\n' || c == '\r', " ")
}

fn escape_string(value: &str) -> String {
    escape(value, &['\\', '"'])
}

fn escape(value: &str, special: &[char]) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            result.push('\\');
        }
        result.push(c);
    }
    result
}
