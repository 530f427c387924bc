pub mod adapter;
pub mod config;
pub mod domain;

use adapter::InfluxRepository;
pub use adapter::HttpInfluxRepository;
use config::InfluxDbConfiguration;
use domain::{
    FilterCriteria, FilterCriteriaQueryCreator, HistoricItem, ItemToStorePointCreator, PersistentItemInfo, map_record,
};

use crate::core::item::{Item, ItemRegistry, MetadataRegistry};

/// Service id, also the metadata namespace holding additional tags
pub const SERVICE_NAME: &str = "influxdb2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceStrategy {
    Restore,
    Change,
}

pub struct PersistenceService<R> {
    config: InfluxDbConfiguration,
    item_registry: ItemRegistry,
    metadata_registry: MetadataRegistry,
    point_creator: ItemToStorePointCreator,
    query_creator: FilterCriteriaQueryCreator,
    repository: R,
}

impl<R: InfluxRepository> PersistenceService<R> {
    pub async fn new(
        config: InfluxDbConfiguration,
        item_registry: ItemRegistry,
        metadata_registry: MetadataRegistry,
        repository: R,
    ) -> anyhow::Result<Self> {
        config.validate()?;

        let service = Self {
            point_creator: ItemToStorePointCreator::new(&config, metadata_registry.clone()),
            query_creator: FilterCriteriaQueryCreator::new(&config),
            config,
            item_registry,
            metadata_registry,
            repository,
        };
        service.connect().await;

        tracing::debug!("InfluxDB persistence service activated");
        Ok(service)
    }

    pub async fn from_config(
        config: InfluxDbConfiguration,
        item_registry: ItemRegistry,
        metadata_registry: MetadataRegistry,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let repository = R::from_config(&config)?;
        Self::new(config, item_registry, metadata_registry, repository).await
    }

    /// Applies a changed configuration by reconnecting with a fresh repository. The current
    /// configuration stays active if the new one is invalid.
    pub async fn modified(&mut self, config: InfluxDbConfiguration) -> anyhow::Result<()> {
        config.validate()?;
        let repository = R::from_config(&config)?;

        tracing::debug!("Configuration modified, reconnecting");
        self.repository.disconnect().await;

        self.point_creator = ItemToStorePointCreator::new(&config, self.metadata_registry.clone());
        self.query_creator = FilterCriteriaQueryCreator::new(&config);
        self.repository = repository;
        self.config = config;
        self.connect().await;

        Ok(())
    }

    pub async fn shutdown(&self) {
        self.repository.disconnect().await;
        tracing::debug!("InfluxDB persistence service deactivated");
    }

    async fn connect(&self) {
        match self.repository.connect().await {
            Ok(true) => tracing::info!(user = %self.config.user, "Connected to InfluxDB {}", self.config.url),
            Ok(false) => tracing::warn!("InfluxDB {} is not ready", self.config.url),
            Err(e) => tracing::error!("Error connecting to InfluxDB {}: {:?}", self.config.url, e),
        }
    }

    /// Retries the connection if InfluxDB was not ready before
    async fn ensure_connected(&self) -> bool {
        if !self.repository.is_connected() {
            self.connect().await;
        }

        self.repository.is_connected()
    }

    pub fn id(&self) -> &'static str {
        SERVICE_NAME
    }

    pub fn label(&self) -> &'static str {
        "InfluxDB2 persistence layer"
    }

    pub fn default_strategies(&self) -> Vec<PersistenceStrategy> {
        vec![PersistenceStrategy::Restore, PersistenceStrategy::Change]
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub async fn store(&self, item: &Item) -> anyhow::Result<()> {
        self.store_with_alias(item, None).await
    }

    #[tracing::instrument(skip_all, fields(item = %item.name))]
    pub async fn store_with_alias(&self, item: &Item, alias: Option<&str>) -> anyhow::Result<()> {
        if !self.ensure_connected().await {
            tracing::warn!("InfluxDB is not yet connected, not storing {}", item.name);
            return Ok(());
        }

        let Some(point) = self.point_creator.convert(item, alias) else {
            tracing::trace!("Ignoring item {} as it cannot be converted to a point", item);
            return Ok(());
        };

        tracing::trace!("Storing item {} as point {}", item, point);
        self.repository.write(&point).await
    }

    #[tracing::instrument(skip_all)]
    pub async fn query(&self, filter: &FilterCriteria) -> anyhow::Result<Vec<HistoricItem>> {
        if !self.ensure_connected().await {
            tracing::warn!("InfluxDB is not yet connected");
            return Ok(vec![]);
        }

        tracing::trace!("Querying historic items with {:?}", filter);

        let query = self.query_creator.create_query(filter, &self.config.bucket);
        let records = self.repository.query(&query).await?;

        Ok(records
            .iter()
            .filter_map(|r| map_record(r, &self.item_registry))
            .collect())
    }

    pub async fn item_info(&self) -> anyhow::Result<Vec<PersistentItemInfo>> {
        if !self.ensure_connected().await {
            tracing::warn!("InfluxDB is not yet connected");
            return Ok(vec![]);
        }

        Ok(self
            .repository
            .stored_items_count()
            .await?
            .into_iter()
            .map(|(name, count)| PersistentItemInfo { name, count })
            .collect())
    }
}
