use std::collections::HashMap;

use infrastructure::EventListener;
use settings::Settings;
use tokio::{
    signal::unix::{SignalKind, signal},
    sync::RwLock,
};
use tokio_util::sync::CancellationToken;

use crate::{
    core::item::{ItemDefinition, ItemRegistry, MetadataRegistry, State},
    dbquery::{DbQueryModule, QueryOutcome, QueryThingConfig},
    heos::{ChannelCommand, ChannelHandler, DynGroupHandling, HeosBridge, ThingRole},
    persistence::{
        HttpInfluxRepository, PersistenceService, PersistenceStrategy, SERVICE_NAME,
        domain::{FilterCriteria, Ordering},
    },
};

mod adapter;
mod core;
mod dbquery;
mod heos;
mod persistence;
mod settings;

/// Item switching the speaker bridge's dynamic group handling
const HEOS_DYNAMIC_GROUPS_ITEM: &str = "Heos_DynamicGroups";

#[tokio::main(flavor = "multi_thread")]
pub async fn main() {
    let settings = Settings::new().expect("Error reading configuration");

    settings.monitoring.init().expect("Error initializing monitoring");

    let item_registry = ItemRegistry::from_definitions(&settings.items);
    let metadata_registry = MetadataRegistry::from_definitions(SERVICE_NAME, &settings.items);

    let persistence = PersistenceService::<HttpInfluxRepository>::from_config(
        settings.persistence.clone(),
        item_registry.clone(),
        metadata_registry,
    )
    .await
    .expect("Error initializing persistence service");

    tracing::info!("Using {} ({})", persistence.label(), persistence.id());

    if persistence.default_strategies().contains(&PersistenceStrategy::Restore) {
        restore_states(&persistence, &item_registry, &settings.items).await;
    }

    let dbquery = DbQueryModule::new(&settings.dbquery).expect("Error initializing query module");
    match dbquery.connect().await {
        Ok(true) => {}
        Ok(false) => tracing::warn!("Query database not ready, queries reconnect on their next run"),
        Err(e) => tracing::error!("Error connecting to query database: {:?}", e),
    }
    send_initial_parameters(&dbquery, &settings.dbquery.queries).await;

    let heos_bridge = HeosBridge::new(settings.heos.handle_groups);
    let dyn_group_handling = DynGroupHandling::new(heos_bridge.clone());

    let linked_items: HashMap<String, String> = settings
        .dbquery
        .queries
        .iter()
        .filter_map(|q| q.item.clone().map(|item| (q.id.clone(), item)))
        .collect();

    let store_on_change = persistence.default_strategies().contains(&PersistenceStrategy::Change);
    let persistence = RwLock::new(persistence);

    let outcome_processor = OutcomeProcessor {
        outcomes: dbquery.subscribe(),
        linked_items,
        item_registry,
        persistence: &persistence,
        dyn_group_handling: &dyn_group_handling,
        store_on_change,
    };

    let cancel = CancellationToken::new();

    tracing::info!("Starting main loop");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Error waiting for shutdown signal: {:?}", e);
        }
        tracing::info!("Shutdown requested");
        cancel.cancel();
    };

    tokio::select!(
        _ = async { tokio::join!(dbquery.run(cancel.clone()), shutdown) } => {},
        _ = outcome_processor.run() => {},
        _ = reload_on_hangup(&persistence) => {},
    );

    persistence.read().await.shutdown().await;
    tracing::info!("Dynamic group handling was {}", heos_bridge.handle_groups());
}

async fn send_initial_parameters(dbquery: &DbQueryModule, queries: &[QueryThingConfig]) {
    for query in queries {
        let Some(json) = &query.parameters else {
            continue;
        };

        let Some(client) = dbquery.client(&query.id) else {
            continue;
        };

        if let Err(e) = client.set_parameters_json(json).await {
            tracing::warn!("Error setting initial parameters of query {}: {:?}", client.query_id(), e);
        }
    }
}

/// Re-reads the persistence settings on SIGHUP. The running configuration stays active if the
/// new one can't be applied.
async fn reload_on_hangup(persistence: &RwLock<PersistenceService<HttpInfluxRepository>>) {
    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(hangup) => hangup,
        Err(e) => {
            tracing::error!("Error listening for reload signal: {:?}", e);
            return std::future::pending().await;
        }
    };

    while hangup.recv().await.is_some() {
        tracing::info!("Reloading persistence configuration");

        let result = match Settings::new() {
            Ok(settings) => persistence.write().await.modified(settings.persistence).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = result {
            tracing::error!("Error reloading persistence configuration: {:?}", e);
        }
    }
}

/// Sets each configured item to its most recently stored state
async fn restore_states(
    persistence: &PersistenceService<HttpInfluxRepository>,
    item_registry: &ItemRegistry,
    items: &[ItemDefinition],
) {
    match persistence.item_info().await {
        Ok(info) => tracing::info!(
            "{} points stored in {} measurements",
            info.iter().map(|i| i.count).sum::<i64>(),
            info.len()
        ),
        Err(e) => tracing::warn!("Error reading stored item info: {:?}", e),
    }

    for def in items {
        let filter = FilterCriteria {
            ordering: Ordering::Descending,
            page_size: Some(1),
            ..FilterCriteria::for_item(&def.name)
        };

        match persistence.query(&filter).await {
            Ok(historic) => {
                if let Some(last) = historic.into_iter().next() {
                    tracing::debug!("Restoring {} to {} from {}", last.name, last.state, last.timestamp);
                    item_registry.update_state(&def.name, last.state);
                }
            }
            Err(e) => tracing::warn!("Error restoring state of {}: {:?}", def.name, e),
        }
    }
}

/// Applies scalar query results to their linked items and stores changed states
struct OutcomeProcessor<'a> {
    outcomes: EventListener<QueryOutcome>,
    linked_items: HashMap<String, String>,
    item_registry: ItemRegistry,
    persistence: &'a RwLock<PersistenceService<HttpInfluxRepository>>,
    dyn_group_handling: &'a DynGroupHandling,
    store_on_change: bool,
}

impl OutcomeProcessor<'_> {
    async fn run(mut self) {
        while let Some(outcome) = self.outcomes.recv().await {
            tracing::debug!(
                "Query {} at {} with parameters {}: {}",
                outcome.query_id,
                outcome.timestamp,
                outcome.parameters_json,
                outcome.extracted_json
            );
            tracing::trace!("Query {} raw result: {}", outcome.query_id, outcome.result_json);

            let Some(item_name) = self.linked_items.get(&outcome.query_id) else {
                continue;
            };

            let Some(value) = outcome.scalar() else {
                tracing::debug!("Query {} has no scalar result for {}", outcome.query_id, item_name);
                continue;
            };

            let state = State::from_scalar(value, self.item_registry.item_type(item_name));
            let Some(item) = self.item_registry.update_state(item_name, state) else {
                continue;
            };

            tracing::info!("Item changed: {}", item);

            if item.name == HEOS_DYNAMIC_GROUPS_ITEM
                && let State::OnOff(on_off) = &item.state
            {
                self.dyn_group_handling
                    .handle_command(ThingRole::Bridge, &ChannelCommand::OnOff(*on_off));
            }

            if !self.store_on_change {
                continue;
            }

            if let Err(e) = self.persistence.read().await.store(&item).await {
                tracing::error!("Error storing item {}: {:?}", item.name, e);
            }
        }
    }
}
