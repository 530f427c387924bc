use serde::Deserialize;

use crate::core::config::{ConfigError, require, require_url};

/// Connection to the InfluxDB 2 server queries are executed against
#[derive(Debug, Clone, Deserialize)]
pub struct InfluxDb2BridgeConfiguration {
    pub url: String,
    #[serde(default)]
    pub user: String,
    pub token: String,
    pub organization: String,
    pub bucket: String,
}

impl InfluxDb2BridgeConfiguration {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_url(&self.url)?;
        require("token", &self.token)?;
        require("organization", &self.organization)?;
        require("bucket", &self.bucket)?;

        Ok(())
    }
}

/// Query of a single query thing and how its result is extracted
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct QueryConfiguration {
    pub query: String,
    /// Seconds between executions, 0 executes only on parameter updates
    #[serde(default)]
    pub interval: u64,
    /// Seconds until an execution is abandoned, 0 waits forever
    #[serde(default)]
    pub timeout: u64,
    #[serde(default)]
    pub scalar_result: bool,
    #[serde(default)]
    scalar_column: Option<String>,
    #[serde(default)]
    pub has_parameters: bool,
}

impl QueryConfiguration {
    pub fn new(
        query: impl Into<String>,
        interval: u64,
        timeout: u64,
        scalar_result: bool,
        scalar_column: Option<String>,
        has_parameters: bool,
    ) -> Self {
        Self {
            query: query.into(),
            interval,
            timeout,
            scalar_result,
            scalar_column,
            has_parameters,
        }
    }

    pub fn scalar_column(&self) -> Option<&str> {
        self.scalar_column.as_deref()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require("query", &self.query)?;

        if self.scalar_column.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(ConfigError::BlankScalarColumn);
        }

        Ok(())
    }
}
