use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, RwLock},
};

use super::{Item, ItemDefinition, ItemType, State};

/// Items known to the host, looked up by name. Cloning shares the underlying registry.
#[derive(Debug, Clone, Default)]
pub struct ItemRegistry {
    items: Arc<RwLock<HashMap<String, Item>>>,
}

impl ItemRegistry {
    pub fn from_definitions(definitions: &[ItemDefinition]) -> Self {
        let registry = Self::default();
        for def in definitions {
            registry.add(def.into());
        }
        registry
    }

    pub fn add(&self, item: Item) {
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        items.insert(item.name.clone(), item);
    }

    pub fn item_type(&self, name: &str) -> Option<ItemType> {
        let items = self.items.read().unwrap_or_else(|e| e.into_inner());
        items.get(name).map(|item| item.item_type)
    }

    /// Sets the state of an item. Returns the updated item only if the state actually changed.
    pub fn update_state(&self, name: &str, state: State) -> Option<Item> {
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        let item = items.get_mut(name)?;

        if item.state == state {
            return None;
        }

        item.state = state;
        Some(item.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetadataKey {
    pub namespace: String,
    pub item_name: String,
}

impl MetadataKey {
    pub fn new(namespace: impl Into<String>, item_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            item_name: item_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metadata {
    pub configuration: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    entries: Arc<RwLock<HashMap<MetadataKey, Metadata>>>,
}

impl MetadataRegistry {
    /// Registers the configured tags of every item under the given namespace
    pub fn from_definitions(namespace: &str, definitions: &[ItemDefinition]) -> Self {
        let registry = Self::default();
        for def in definitions.iter().filter(|d| !d.tags.is_empty()) {
            registry.add(
                MetadataKey::new(namespace, &def.name),
                Metadata {
                    configuration: def.tags.clone(),
                },
            );
        }
        registry
    }

    pub fn add(&self, key: MetadataKey, metadata: Metadata) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, metadata);
    }

    pub fn get(&self, key: &MetadataKey) -> Option<Metadata> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }
}
