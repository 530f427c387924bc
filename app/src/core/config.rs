use derive_more::{Display, Error};

#[derive(Debug, Display, Error, PartialEq)]
pub enum ConfigError {
    #[display("Missing required configuration parameter {name}")]
    MissingParameter { name: &'static str },

    #[display("Invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[display("Scalar column must not be blank")]
    BlankScalarColumn,
}

pub fn require(name: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::MissingParameter { name })
    } else {
        Ok(())
    }
}

pub fn require_url(url: &str) -> Result<(), ConfigError> {
    require("url", url)?;

    reqwest::Url::parse(url).map(|_| ()).map_err(|e| ConfigError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })
}
