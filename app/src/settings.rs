use config::{Config, ConfigError, Environment, File};
use infrastructure::MonitoringConfig;
use serde::Deserialize;

use crate::{core::item::ItemDefinition, dbquery::DbQueryConfig, persistence::config::InfluxDbConfiguration};

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub monitoring: MonitoringConfig,
    pub persistence: InfluxDbConfiguration,
    pub dbquery: DbQueryConfig,
    #[serde(default)]
    pub heos: HeosSettings,
    #[serde(default)]
    pub items: Vec<ItemDefinition>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config.toml"))
            .add_source(Environment::default().separator("_").list_separator(","));

        let s = builder.build()?;
        s.try_deserialize()
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct HeosSettings {
    #[serde(default)]
    pub handle_groups: bool,
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;
    use crate::core::item::ItemType;

    fn parse(toml: &str) -> Result<Settings, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn sample_configuration_is_valid() {
        let settings = parse(include_str!("../../config.toml")).unwrap();

        assert_eq!(settings.monitoring.service_name, "home-addons");
        assert_eq!(settings.persistence.validate(), Ok(()));
        assert_eq!(settings.dbquery.bridge.validate(), Ok(()));
        assert_eq!(settings.dbquery.queries.len(), 2);
        assert!(settings.dbquery.queries.iter().all(|q| q.query.validate().is_ok()));
        assert_eq!(
            settings.dbquery.queries[1].parameters.as_deref(),
            Some(r#"{"item": "OutsideTemperature"}"#)
        );
        assert_eq!(settings.items.len(), 3);
        assert_eq!(settings.items[2].item_type, ItemType::Switch);
        assert_eq!(settings.items[1].tags.get("room").map(String::as_str), Some("garden"));
    }

    #[test]
    fn query_defaults_are_applied() {
        let settings = parse(
            r#"
            [monitoring]
            service_name = "test"
            logs = { default_level = "info" }

            [persistence]
            url = "http://localhost:8086"
            token = "t"
            organization = "o"
            bucket = "b"

            [dbquery.bridge]
            url = "http://localhost:8086"
            token = "t"
            organization = "o"
            bucket = "b"

            [[dbquery.queries]]
            id = "q"
            query = "from(bucket: \"b\")"
            "#,
        )
        .unwrap();

        let query = &settings.dbquery.queries[0];
        assert_eq!(query.item, None);
        assert_eq!(query.parameters, None);
        assert_eq!(query.query.interval, 0);
        assert!(!query.query.scalar_result);
        assert!(!settings.heos.handle_groups);
        assert!(settings.items.is_empty());
    }
}
