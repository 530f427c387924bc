use std::fmt::Display;

use chrono::{SecondsFormat, Utc};
use tokio::task_local;

task_local! {
    pub static FIXED_NOW: DateTime;
}

/// Instant in time, always kept in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DateTime {
    delegate: chrono::DateTime<Utc>,
}

impl DateTime {
    fn new<T: chrono::TimeZone>(delegate: chrono::DateTime<T>) -> Self {
        Self {
            delegate: delegate.with_timezone(&Utc),
        }
    }

    pub fn now() -> Self {
        FIXED_NOW.try_with(|t| *t).unwrap_or_else(|_| Utc::now().into())
    }

    pub fn from_iso(iso8601: &str) -> anyhow::Result<Self> {
        Ok(chrono::DateTime::parse_from_rfc3339(iso8601)?.into())
    }

    pub fn from_millis(millis: i64) -> Option<Self> {
        chrono::DateTime::from_timestamp_millis(millis).map(Self::new)
    }

    /// ISO-8601 instant in UTC, e.g. `2024-01-01T10:00:00.123Z`
    pub fn to_iso_string(&self) -> String {
        self.delegate.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    pub fn millis(&self) -> i64 {
        self.delegate.timestamp_millis()
    }
}

impl Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_iso_string())
    }
}

impl<T: chrono::TimeZone> From<chrono::DateTime<T>> for DateTime {
    fn from(val: chrono::DateTime<T>) -> Self {
        DateTime::new(val)
    }
}
