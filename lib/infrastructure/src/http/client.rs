use anyhow::Context as _;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest_middleware::ClientWithMiddleware;
use reqwest_tracing::TracingMiddleware;

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Scheme of the `Authorization` header, e.g. `Bearer` or `Token`
    auth_scheme: &'static str,
    auth_token: Option<String>,
}

impl HttpClientConfig {
    /// InfluxDB 2 expects `Authorization: Token <token>`
    pub fn token(token: impl Into<String>) -> Self {
        Self {
            auth_scheme: "Token",
            auth_token: Some(token.into()),
        }
    }

    pub fn new_tracing_client(&self) -> anyhow::Result<ClientWithMiddleware> {
        let mut headers = HeaderMap::new();

        if let Some(token) = self.auth_token.as_ref().filter(|t| !t.is_empty()) {
            let mut auth_value = HeaderValue::from_str(&format!("{} {}", self.auth_scheme, token))
                .context("Authorization token contains invalid header characters")?;
            auth_value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, auth_value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Error building HTTP client")?;

        Ok(reqwest_middleware::ClientBuilder::new(client)
            .with(TracingMiddleware::default())
            .build())
    }
}
