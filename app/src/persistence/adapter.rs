#![allow(async_fn_in_trait)]

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicBool, Ordering},
};

use crate::{
    adapter::influx::{FluxRecord, HttpInfluxClient},
    core::value::ScalarValue,
};

use super::{
    config::InfluxDbConfiguration,
    domain::{COLUMN_VALUE_NAME, FIELD_VALUE_NAME, StoragePoint, escape_flux},
};

pub trait InfluxRepository {
    fn from_config(config: &InfluxDbConfiguration) -> anyhow::Result<Self>
    where
        Self: Sized;

    async fn connect(&self) -> anyhow::Result<bool>;

    async fn disconnect(&self);

    fn is_connected(&self) -> bool;

    async fn write(&self, point: &StoragePoint) -> anyhow::Result<()>;

    async fn query(&self, flux: &str) -> anyhow::Result<Vec<FluxRecord>>;

    /// Number of stored points per measurement
    async fn stored_items_count(&self) -> anyhow::Result<BTreeMap<String, i64>>;
}

pub struct HttpInfluxRepository {
    client: HttpInfluxClient,
    bucket: String,
    connected: AtomicBool,
}

impl InfluxRepository for HttpInfluxRepository {
    fn from_config(config: &InfluxDbConfiguration) -> anyhow::Result<Self> {
        Ok(Self {
            client: HttpInfluxClient::new(&config.url, &config.token, &config.organization)?,
            bucket: config.bucket.clone(),
            connected: AtomicBool::new(false),
        })
    }

    async fn connect(&self) -> anyhow::Result<bool> {
        let ready = self.client.ready().await?;
        self.connected.store(ready, Ordering::SeqCst);
        Ok(ready)
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn write(&self, point: &StoragePoint) -> anyhow::Result<()> {
        self.client.write(&self.bucket, &[point.to_line_protocol()]).await
    }

    async fn query(&self, flux: &str) -> anyhow::Result<Vec<FluxRecord>> {
        self.client.query(flux).await
    }

    #[tracing::instrument(skip(self))]
    async fn stored_items_count(&self) -> anyhow::Result<BTreeMap<String, i64>> {
        let flux = format!(
            "from(bucket: \"{}\")\n  |> range(start: -100y)\n  |> filter(fn: (r) => r[\"_field\"] == \"{}\")\n  |> group(columns: [\"_measurement\"])\n  |> count()",
            escape_flux(&self.bucket),
            FIELD_VALUE_NAME
        );

        let records = self.client.query(&flux).await?;

        Ok(records
            .iter()
            .filter_map(|r| match (r.value("_measurement"), r.value(COLUMN_VALUE_NAME)) {
                (Some(ScalarValue::Text(name)), Some(ScalarValue::Integer(count))) => Some((name.clone(), *count)),
                _ => {
                    tracing::warn!("Ignoring unexpected count record {:?}", r);
                    None
                }
            })
            .collect())
    }
}
