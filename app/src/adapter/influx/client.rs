use anyhow::Context as _;
use infrastructure::HttpClientConfig;
use reqwest::header;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde_json::json;

use super::{FluxRecord, parse_annotated_csv};

/// Thin client for the InfluxDB 2 HTTP API
#[derive(Debug, Clone)]
pub struct HttpInfluxClient {
    client: ClientWithMiddleware,
    base_url: String,
    organization: String,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

impl HttpInfluxClient {
    pub fn new(url: &str, token: &str, organization: &str) -> anyhow::Result<Self> {
        let client = HttpClientConfig::token(token).new_tracing_client()?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_owned(),
            organization: organization.to_owned(),
        })
    }

    /// True if the server reports itself healthy
    #[tracing::instrument(skip(self))]
    pub async fn ready(&self) -> anyhow::Result<bool> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .with_context(|| format!("Error connecting to InfluxDB at {}", self.base_url))?;

        if !response.status().is_success() {
            tracing::warn!("InfluxDB health check returned status {}", response.status());
            return Ok(false);
        }

        let health = response
            .json::<HealthResponse>()
            .await
            .context("Error reading InfluxDB health response")?;

        Ok(health.status == "pass")
    }

    #[tracing::instrument(skip(self))]
    pub async fn query(&self, flux: &str) -> anyhow::Result<Vec<FluxRecord>> {
        let body = json!({
            "query": flux,
            "type": "flux",
            "dialect": {
                "header": true,
                "delimiter": ",",
                "annotations": ["datatype", "group", "default"],
                "dateTimeFormat": "RFC3339",
            }
        });

        let response = self
            .client
            .post(format!("{}/api/v2/query", self.base_url))
            .query(&[("org", self.organization.as_str())])
            .header(header::ACCEPT, "application/csv")
            .json(&body)
            .send()
            .await
            .context("Error sending query to InfluxDB")?;

        let status = response.status();
        let text = response.text().await.context("Error reading InfluxDB query response")?;

        if !status.is_success() {
            anyhow::bail!("{}", error_message(status, &text));
        }

        parse_annotated_csv(&text)
    }

    /// Writes line protocol lines with millisecond precision
    #[tracing::instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn write(&self, bucket: &str, lines: &[String]) -> anyhow::Result<()> {
        if lines.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .post(format!("{}/api/v2/write", self.base_url))
            .query(&[
                ("org", self.organization.as_str()),
                ("bucket", bucket),
                ("precision", "ms"),
            ])
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(lines.join("\n"))
            .send()
            .await
            .context("Error sending points to InfluxDB")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("Error writing to bucket {}: {}", bucket, error_message(status, &text));
        }

        Ok(())
    }
}

fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => err.message,
        Err(_) if body.trim().is_empty() => format!("InfluxDB returned status {}", status),
        Err(_) => body.trim().to_owned(),
    }
}
