pub mod adapter;
pub mod config;
pub mod domain;
mod runner;

use std::sync::Arc;

use infrastructure::{EventBus, EventListener};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use adapter::{Database, Influx2Database};
use config::{InfluxDb2BridgeConfiguration, QueryConfiguration};
pub use runner::{QueryClient, QueryOutcome, QueryRunner};

use crate::adapter::influx::HttpInfluxClient;

/// Query thing as configured, optionally linked to the item receiving its scalar result
#[derive(Debug, Clone, Deserialize)]
pub struct QueryThingConfig {
    pub id: String,
    pub item: Option<String>,
    /// JSON object sent as parameters when the query starts
    #[serde(default)]
    pub parameters: Option<String>,
    #[serde(flatten)]
    pub query: QueryConfiguration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DbQueryConfig {
    pub bridge: InfluxDb2BridgeConfiguration,
    #[serde(default)]
    pub queries: Vec<QueryThingConfig>,
}

pub struct DbQueryModule<D = Influx2Database<HttpInfluxClient>> {
    database: Arc<D>,
    runners: Vec<QueryRunner<D>>,
    event_bus: EventBus<QueryOutcome>,
}

impl DbQueryModule {
    pub fn new(config: &DbQueryConfig) -> anyhow::Result<Self> {
        let database = Influx2Database::from_config(config.bridge.clone())?;
        Self::with_database(database, &config.queries)
    }
}

impl<D: Database> DbQueryModule<D> {
    pub fn with_database(database: D, queries: &[QueryThingConfig]) -> anyhow::Result<Self> {
        let database = Arc::new(database);
        let event_bus = EventBus::new(64);

        let runners = queries
            .iter()
            .map(|q| {
                q.query
                    .validate()
                    .map_err(|e| anyhow::anyhow!("Invalid configuration of query {}: {}", q.id, e))?;
                Ok(QueryRunner::new(&q.id, q.query.clone(), database.clone(), event_bus.emitter()))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            database,
            runners,
            event_bus,
        })
    }

    pub async fn connect(&self) -> anyhow::Result<bool> {
        self.database.connect().await
    }

    pub fn client(&self, query_id: &str) -> Option<QueryClient> {
        self.runners.iter().find(|r| r.query_id() == query_id).map(|r| r.client())
    }

    pub fn subscribe(&self) -> EventListener<QueryOutcome> {
        self.event_bus.subscribe()
    }

    /// Runs all queries until cancelled, then disconnects from the database
    pub async fn run(self, cancel: CancellationToken) {
        let runners = self.runners.into_iter().map(|r| r.run(cancel.clone()));
        futures::future::join_all(runners).await;

        self.database.disconnect().await;
    }
}
