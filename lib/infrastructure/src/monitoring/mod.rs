use std::error::Error;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MonitoringConfig {
    pub service_name: String,
    pub logs: EnvFilterConfig,
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct EnvFilterConfig {
    pub default_level: String,
    #[serde(default)]
    pub filters: Vec<String>,
}

impl TryInto<EnvFilter> for EnvFilterConfig {
    type Error = tracing_subscriber::filter::ParseError;

    fn try_into(self) -> Result<EnvFilter, Self::Error> {
        EnvFilter::builder()
            .with_default_directive(self.default_level.parse()?)
            .parse(self.filters.join(","))
    }
}

impl MonitoringConfig {
    pub fn init(&self) -> Result<(), Box<dyn Error>> {
        let logging_filter: EnvFilter = self.logs.clone().try_into()?;

        //json and plain layers have different types, hence the two registries
        if self.json {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
                .with(logging_filter)
                .try_init()?;
        } else {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer())
                .with(logging_filter)
                .try_init()?;
        }

        tracing::info!("Monitoring initialized for service {}", self.service_name);

        Ok(())
    }
}
