use crate::{
    adapter::influx::FluxRecord,
    core::{
        item::{ItemRegistry, State},
        time::DateTime,
        value::ScalarValue,
    },
};

use super::{COLUMN_TIME_NAME, COLUMN_VALUE_NAME, TAG_ITEM_NAME};

#[derive(Debug, Clone, PartialEq)]
pub struct HistoricItem {
    pub name: String,
    pub state: State,
    pub timestamp: DateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistentItemInfo {
    pub name: String,
    pub count: i64,
}

/// Maps a queried record back to the item state it was stored from. The state is interpreted
/// according to the type of the registered item.
pub fn map_record(record: &FluxRecord, item_registry: &ItemRegistry) -> Option<HistoricItem> {
    let Some(name) = record.value(TAG_ITEM_NAME).and_then(ScalarValue::as_text) else {
        tracing::warn!("Ignoring record without item name: {:?}", record);
        return None;
    };

    let timestamp = match record.value(COLUMN_TIME_NAME) {
        Some(ScalarValue::Timestamp(dt)) => *dt,
        Some(ScalarValue::Integer(millis)) => DateTime::from_millis(*millis)?,
        _ => {
            tracing::warn!("Ignoring record of {} without valid time: {:?}", name, record);
            return None;
        }
    };

    let Some(value) = record.value(COLUMN_VALUE_NAME) else {
        tracing::warn!("Ignoring record of {} without value", name);
        return None;
    };

    Some(HistoricItem {
        name: name.to_owned(),
        state: State::from_scalar(value, item_registry.item_type(name)),
        timestamp,
    })
}
