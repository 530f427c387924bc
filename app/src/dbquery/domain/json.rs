use anyhow::Context as _;

use super::{ExtractedResult, QueryParameters, QueryResult};

/// JSON representation of query results and parameters as published on the result channels
#[derive(Debug, Clone, Copy, Default)]
pub struct DbQueryJsonEncoder;

impl DbQueryJsonEncoder {
    pub fn encode_result(&self, result: &QueryResult) -> anyhow::Result<String> {
        serde_json::to_string(result).context("Error encoding query result")
    }

    pub fn encode_parameters(&self, parameters: &QueryParameters) -> anyhow::Result<String> {
        serde_json::to_string(parameters).context("Error encoding query parameters")
    }

    pub fn encode_extracted(&self, extracted: &ExtractedResult) -> anyhow::Result<String> {
        serde_json::to_string(extracted).context("Error encoding extracted result")
    }
}
