use std::collections::BTreeMap;

use anyhow::Context as _;
use serde::Serialize;

use crate::core::value::ScalarValue;

/// Named values substituted into a query before it's executed
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct QueryParameters {
    params: BTreeMap<String, ScalarValue>,
}

impl QueryParameters {
    pub const EMPTY: QueryParameters = QueryParameters { params: BTreeMap::new() };

    pub fn new(params: BTreeMap<String, ScalarValue>) -> Self {
        Self { params }
    }

    /// Parses parameters from a JSON object, e.g. `{"item": "temp", "limit": 10}`
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json).context("Parameters are not valid JSON")?;

        let serde_json::Value::Object(object) = value else {
            anyhow::bail!("Parameters must be a JSON object, got {}", json);
        };

        Ok(Self::new(
            object
                .iter()
                .map(|(k, v)| (k.clone(), ScalarValue::from_json(v)))
                .collect(),
        ))
    }

    pub fn get(&self, name: &str) -> Option<&ScalarValue> {
        self.params.get(name)
    }
}

impl<K: Into<String>, V: Into<ScalarValue>> FromIterator<(K, V)> for QueryParameters {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
