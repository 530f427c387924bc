use crate::{
    core::{
        item::{Item, MetadataKey, MetadataRegistry},
        time::DateTime,
    },
    persistence::{SERVICE_NAME, config::InfluxDbConfiguration},
};

use super::{FieldValue, StoragePoint};

pub const TAG_ITEM_NAME: &str = "item";
pub const TAG_CATEGORY_NAME: &str = "category";
pub const TAG_LABEL_NAME: &str = "label";
pub const TAG_TYPE_NAME: &str = "type";

/// Converts items to points according to the tagging options of the configuration
#[derive(Debug, Clone)]
pub struct ItemToStorePointCreator {
    add_category_tag: bool,
    add_label_tag: bool,
    add_type_tag: bool,
    replace_underscore: bool,
    metadata_registry: MetadataRegistry,
}

impl ItemToStorePointCreator {
    pub fn new(config: &InfluxDbConfiguration, metadata_registry: MetadataRegistry) -> Self {
        Self {
            add_category_tag: config.add_category_tag,
            add_label_tag: config.add_label_tag,
            add_type_tag: config.add_type_tag,
            replace_underscore: config.replace_underscore,
            metadata_registry,
        }
    }

    /// None if the item's state can't be stored
    pub fn convert(&self, item: &Item, alias: Option<&str>) -> Option<StoragePoint> {
        let value = FieldValue::from_state(&item.state)?;

        let name = alias.filter(|a| !a.is_empty()).unwrap_or(&item.name);
        let mut point = StoragePoint::new(measurement_name(name, self.replace_underscore), value, DateTime::now());
        point.add_tag(TAG_ITEM_NAME, &item.name);

        if self.add_category_tag
            && let Some(category) = &item.category
        {
            point.add_tag(TAG_CATEGORY_NAME, category);
        }

        if self.add_label_tag
            && let Some(label) = &item.label
        {
            point.add_tag(TAG_LABEL_NAME, label);
        }

        if self.add_type_tag {
            point.add_tag(TAG_TYPE_NAME, item.item_type.to_string());
        }

        if let Some(metadata) = self.metadata_registry.get(&MetadataKey::new(SERVICE_NAME, &item.name)) {
            for (name, value) in metadata.configuration {
                point.add_tag(name, value);
            }
        }

        Some(point)
    }
}

/// Measurement the points of `name` are stored under. Shared by the write and the read path.
pub fn measurement_name(name: &str, replace_underscore: bool) -> String {
    if replace_underscore {
        name.replace('_', ".")
    } else {
        name.to_owned()
    }
}
