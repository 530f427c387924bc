mod registry;
mod state;

use std::collections::BTreeMap;

use serde::Deserialize;

pub use registry::{ItemRegistry, Metadata, MetadataKey, MetadataRegistry};
pub use state::{OnOff, OpenClosed, State, UnDef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, derive_more::Display)]
pub enum ItemType {
    Number,
    Switch,
    Contact,
    Dimmer,
    Rollershutter,
    String,
    DateTime,
    Color,
    Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub name: String,
    pub item_type: ItemType,
    pub state: State,
    pub label: Option<String>,
    pub category: Option<String>,
}

impl Item {
    pub fn new(name: impl Into<String>, item_type: ItemType) -> Self {
        Self {
            name: name.into(),
            item_type,
            state: State::Undefined(UnDef::Null),
            label: None,
            category: None,
        }
    }
}

#[cfg(test)]
impl Item {
    pub fn with_state(mut self, state: State) -> Self {
        self.state = state;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) = {}", self.name, self.item_type, self.state)
    }
}

/// Item as declared in the configuration file, with its free-form tag metadata
#[derive(Debug, Clone, Deserialize)]
pub struct ItemDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub label: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl From<&ItemDefinition> for Item {
    fn from(def: &ItemDefinition) -> Self {
        Item {
            name: def.name.clone(),
            item_type: def.item_type,
            state: State::Undefined(UnDef::Null),
            label: def.label.clone(),
            category: def.category.clone(),
        }
    }
}
