use serde::Deserialize;

use crate::core::config::{ConfigError, require, require_url};

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InfluxDbConfiguration {
    pub url: String,
    #[serde(default)]
    pub user: String,
    pub token: String,
    pub organization: String,
    pub bucket: String,
    #[serde(default)]
    pub add_category_tag: bool,
    #[serde(default)]
    pub add_label_tag: bool,
    #[serde(default)]
    pub add_type_tag: bool,
    /// Stores `my_item` as measurement `my.item`
    #[serde(default)]
    pub replace_underscore: bool,
}

impl InfluxDbConfiguration {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_url(&self.url)?;
        require("token", &self.token)?;
        require("organization", &self.organization)?;
        require("bucket", &self.bucket)
    }
}
