use std::fmt::Display;

use crate::core::{time::DateTime, value::ScalarValue};

use super::ItemType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum OnOff {
    #[display("ON")]
    On,
    #[display("OFF")]
    Off,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum OpenClosed {
    #[display("OPEN")]
    Open,
    #[display("CLOSED")]
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum UnDef {
    #[display("NULL")]
    Null,
    #[display("UNDEF")]
    Undef,
}

#[derive(Debug, Clone, PartialEq)]
pub enum State {
    Integer(i64),
    Decimal(f64),
    OnOff(OnOff),
    OpenClosed(OpenClosed),
    Percent(f64),
    DateTime(DateTime),
    Text(String),
    Hsb {
        hue: f64,
        saturation: f64,
        brightness: f64,
    },
    Point {
        latitude: f64,
        longitude: f64,
        altitude: Option<f64>,
    },
    Undefined(UnDef),
}

impl State {
    /// Converts a raw stored or queried value into a state. With a known item type the value is
    /// interpreted for that type, otherwise (or if it doesn't fit the type) a best-effort state is
    /// derived from the value's own kind.
    pub fn from_scalar(value: &ScalarValue, item_type: Option<ItemType>) -> State {
        if value.is_null() {
            return State::Undefined(UnDef::Null);
        }

        let typed = match item_type {
            Some(ItemType::Switch) => Some(State::OnOff(if to_bool(value) { OnOff::On } else { OnOff::Off })),
            Some(ItemType::Contact) => Some(State::OpenClosed(if to_bool(value) {
                OpenClosed::Open
            } else {
                OpenClosed::Closed
            })),
            Some(ItemType::Dimmer) | Some(ItemType::Rollershutter) => value.as_f64().map(State::Percent),
            Some(ItemType::DateTime) => match value {
                ScalarValue::Timestamp(dt) => Some(State::DateTime(*dt)),
                ScalarValue::Integer(millis) => DateTime::from_millis(*millis).map(State::DateTime),
                ScalarValue::Text(s) => DateTime::from_iso(s).ok().map(State::DateTime),
                _ => None,
            },
            Some(ItemType::Color) => value.as_text().and_then(parse_hsb),
            Some(ItemType::Location) => value.as_text().and_then(parse_point),
            Some(ItemType::Number) => match value {
                ScalarValue::Integer(i) => Some(State::Integer(*i)),
                ScalarValue::Float(f) => Some(State::Decimal(*f)),
                ScalarValue::Text(s) => parse_number(s),
                _ => None,
            },
            Some(ItemType::String) => Some(State::Text(value.to_string())),
            None => None,
        };

        typed.unwrap_or_else(|| {
            if let Some(item_type) = item_type {
                tracing::debug!("Value {:?} doesn't fit item type {}, using untyped state", value, item_type);
            }
            untyped(value)
        })
    }
}

fn untyped(value: &ScalarValue) -> State {
    match value {
        ScalarValue::Integer(i) => State::Integer(*i),
        ScalarValue::Float(f) => State::Decimal(*f),
        ScalarValue::Boolean(b) => State::OnOff(if *b { OnOff::On } else { OnOff::Off }),
        ScalarValue::Text(s) => State::Text(s.clone()),
        ScalarValue::Timestamp(dt) => State::DateTime(*dt),
        ScalarValue::Null => State::Undefined(UnDef::Null),
    }
}

fn to_bool(value: &ScalarValue) -> bool {
    match value {
        ScalarValue::Boolean(b) => *b,
        ScalarValue::Integer(i) => *i == 1,
        ScalarValue::Float(f) => *f == 1.0,
        ScalarValue::Text(s) => {
            let s = s.trim();
            s == "1" || s == "1.0" || ["true", "on", "open"].iter().any(|t| s.eq_ignore_ascii_case(t))
        }
        ScalarValue::Timestamp(_) | ScalarValue::Null => false,
    }
}

fn parse_number(s: &str) -> Option<State> {
    let s = s.trim();
    s.parse::<i64>()
        .map(State::Integer)
        .ok()
        .or_else(|| s.parse::<f64>().ok().map(State::Decimal))
}

fn parse_components(s: &str) -> Option<Vec<f64>> {
    s.split(',').map(|p| p.trim().parse::<f64>().ok()).collect()
}

fn parse_hsb(s: &str) -> Option<State> {
    match parse_components(s)?.as_slice() {
        [hue, saturation, brightness] => Some(State::Hsb {
            hue: *hue,
            saturation: *saturation,
            brightness: *brightness,
        }),
        _ => None,
    }
}

fn parse_point(s: &str) -> Option<State> {
    match parse_components(s)?.as_slice() {
        [latitude, longitude] => Some(State::Point {
            latitude: *latitude,
            longitude: *longitude,
            altitude: None,
        }),
        [latitude, longitude, altitude] => Some(State::Point {
            latitude: *latitude,
            longitude: *longitude,
            altitude: Some(*altitude),
        }),
        _ => None,
    }
}

impl Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Integer(i) => write!(f, "{}", i),
            State::Decimal(d) => write!(f, "{}", d),
            State::OnOff(v) => write!(f, "{}", v),
            State::OpenClosed(v) => write!(f, "{}", v),
            State::Percent(p) => write!(f, "{}", p),
            State::DateTime(dt) => write!(f, "{}", dt),
            State::Text(s) => write!(f, "{}", s),
            State::Hsb {
                hue,
                saturation,
                brightness,
            } => write!(f, "{},{},{}", hue, saturation, brightness),
            State::Point {
                latitude,
                longitude,
                altitude,
            } => match altitude {
                Some(altitude) => write!(f, "{},{},{}", latitude, longitude, altitude),
                None => write!(f, "{},{}", latitude, longitude),
            },
            State::Undefined(u) => write!(f, "{}", u),
        }
    }
}
