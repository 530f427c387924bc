use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    adapter::influx::{FluxRecord, HttpInfluxClient},
    dbquery::{
        config::InfluxDb2BridgeConfiguration,
        domain::{Query, QueryFactory, QueryResult, ResultRow},
    },
};

use super::Database;

/// Seam between the database and the InfluxDB client library
pub trait InfluxClientFacade {
    async fn connect(&self) -> anyhow::Result<bool>;

    async fn disconnect(&self) {}

    async fn query(&self, flux: &str) -> anyhow::Result<Vec<FluxRecord>>;
}

impl InfluxClientFacade for HttpInfluxClient {
    async fn connect(&self) -> anyhow::Result<bool> {
        self.ready().await
    }

    async fn query(&self, flux: &str) -> anyhow::Result<Vec<FluxRecord>> {
        HttpInfluxClient::query(self, flux).await
    }
}

pub struct Influx2Database<C> {
    config: InfluxDb2BridgeConfiguration,
    client: C,
    connected: AtomicBool,
}

impl Influx2Database<HttpInfluxClient> {
    pub fn from_config(config: InfluxDb2BridgeConfiguration) -> anyhow::Result<Self> {
        config.validate()?;
        let client = HttpInfluxClient::new(&config.url, &config.token, &config.organization)?;
        Ok(Self::new(config, client))
    }
}

impl<C: InfluxClientFacade> Influx2Database<C> {
    pub fn new(config: InfluxDb2BridgeConfiguration, client: C) -> Self {
        Self {
            config,
            client,
            connected: AtomicBool::new(false),
        }
    }
}

impl<C: InfluxClientFacade> Database for Influx2Database<C> {
    async fn connect(&self) -> anyhow::Result<bool> {
        let connected = self.client.connect().await?;
        self.connected.store(connected, Ordering::SeqCst);

        if connected {
            tracing::info!(
                user = %self.config.user,
                "Connected to InfluxDB {} (bucket {})",
                self.config.url,
                self.config.bucket
            );
        } else {
            tracing::warn!("InfluxDB {} is not ready", self.config.url);
        }

        Ok(connected)
    }

    async fn disconnect(&self) {
        self.client.disconnect().await;
        self.connected.store(false, Ordering::SeqCst);
        tracing::debug!("Disconnected from InfluxDB {}", self.config.url);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn query_factory(&self) -> QueryFactory {
        QueryFactory
    }

    #[tracing::instrument(skip_all)]
    async fn execute_query(&self, query: &Query) -> anyhow::Result<QueryResult> {
        if !self.is_connected() {
            anyhow::bail!("Database {} is not connected", self.config.url);
        }

        match self.client.query(query.text()).await {
            Ok(records) if records.is_empty() => Ok(QueryResult::no_results()),
            Ok(records) => {
                tracing::trace!("Query returned {} records", records.len());
                Ok(QueryResult::of(
                    records.into_iter().map(|r| ResultRow::new(r.values)).collect(),
                ))
            }
            Err(e) => {
                tracing::warn!("Error executing query {}: {:?}", query.text(), e);
                Ok(QueryResult::of_incorrect_result(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::{
        core::{time::DateTime, value::ScalarValue},
        dbquery::domain::QueryParameters,
    };

    pub const SCALAR_QUERY: &str = "scalar";
    pub const MULTIPLE_ROWS_QUERY: &str = "multiple";
    pub const EMPTY_QUERY: &str = "empty";
    pub const INVALID_QUERY: &str = "invalid";
    pub const MULTIPLE_ROWS_SIZE: usize = 3;
    pub const SCALAR_RESULT: i64 = 21;
    pub const VALUE_COLUMN: &str = "_value";
    pub const TIME_COLUMN: &str = "_time";
    pub const MULTIPLE_ROWS_VALUE_PREFIX: &str = "value";

    /// Answers a fixed set of queries without a server
    pub struct InfluxClientFacadeMock;

    impl InfluxClientFacade for InfluxClientFacadeMock {
        async fn connect(&self) -> anyhow::Result<bool> {
            Ok(true)
        }

        async fn query(&self, flux: &str) -> anyhow::Result<Vec<FluxRecord>> {
            match flux {
                SCALAR_QUERY => Ok(vec![FluxRecord {
                    values: BTreeMap::from([(VALUE_COLUMN.to_owned(), ScalarValue::Integer(SCALAR_RESULT))]),
                }]),
                MULTIPLE_ROWS_QUERY => Ok((0..MULTIPLE_ROWS_SIZE)
                    .map(|i| FluxRecord {
                        values: BTreeMap::from([
                            (
                                VALUE_COLUMN.to_owned(),
                                ScalarValue::Text(format!("{}{}", MULTIPLE_ROWS_VALUE_PREFIX, i)),
                            ),
                            (TIME_COLUMN.to_owned(), ScalarValue::Timestamp(DateTime::now())),
                        ]),
                    })
                    .collect()),
                EMPTY_QUERY => Ok(vec![]),
                _ => anyhow::bail!("invalid query"),
            }
        }
    }

    pub fn bridge_config() -> InfluxDb2BridgeConfiguration {
        InfluxDb2BridgeConfiguration {
            url: "http://localhost:8086".to_owned(),
            user: String::new(),
            token: "token".to_owned(),
            organization: "home".to_owned(),
            bucket: "states".to_owned(),
        }
    }

    fn instance() -> Influx2Database<InfluxClientFacadeMock> {
        Influx2Database::new(bridge_config(), InfluxClientFacadeMock)
    }

    async fn execute(instance: &Influx2Database<InfluxClientFacadeMock>, text: &str) -> anyhow::Result<QueryResult> {
        let query = instance.query_factory().create_query(text, &QueryParameters::EMPTY, None);
        instance.execute_query(&query).await
    }

    #[tokio::test]
    async fn query_that_returns_scalar_result_gets_valid_scalar_result() {
        let instance = instance();
        instance.connect().await.unwrap();

        let result = execute(&instance, SCALAR_QUERY).await.unwrap();

        assert!(result.is_correct());
        assert_eq!(result.data().len(), 1);
        assert_eq!(result.data()[0].columns_size(), 1);
    }

    #[tokio::test]
    async fn query_that_returns_multiple_rows_gets_valid_query_result() {
        let instance = instance();
        instance.connect().await.unwrap();

        let result = execute(&instance, MULTIPLE_ROWS_QUERY).await.unwrap();

        assert!(result.is_correct());
        assert_eq!(result.data().len(), MULTIPLE_ROWS_SIZE);
        assert!(result.data().iter().all(|row| {
            let value = row.value(VALUE_COLUMN).and_then(ScalarValue::as_text);
            let time = row.value(TIME_COLUMN);
            value.is_some_and(|v| v.contains(MULTIPLE_ROWS_VALUE_PREFIX)) && time.is_some()
        }));
    }

    #[tokio::test]
    async fn query_that_returns_error_gets_erroneous_result() {
        let instance = instance();
        instance.connect().await.unwrap();

        let result = execute(&instance, INVALID_QUERY).await.unwrap();

        assert!(!result.is_correct());
        assert_eq!(result.error_message(), Some("invalid query"));
        assert!(result.data().is_empty());
    }

    #[tokio::test]
    async fn query_that_returns_no_rows_gets_empty_result() {
        let instance = instance();
        instance.connect().await.unwrap();

        let result = execute(&instance, EMPTY_QUERY).await.unwrap();

        assert!(result.is_correct());
        assert!(result.data().is_empty());
    }

    #[tokio::test]
    async fn not_connected_client_fails_execution() {
        let instance = instance();

        assert!(execute(&instance, SCALAR_QUERY).await.is_err());
    }

    #[tokio::test]
    async fn disconnect_stops_execution() {
        let instance = instance();
        instance.connect().await.unwrap();
        instance.disconnect().await;

        assert!(!instance.is_connected());
        assert!(execute(&instance, SCALAR_QUERY).await.is_err());
    }

    #[test]
    fn invalid_bridge_configuration_is_rejected() {
        let mut config = bridge_config();
        config.token = String::new();

        assert!(Influx2Database::from_config(config).is_err());
    }
}
