//! Typed configuration for the collector endpoint and telemetry.
//!
//! Loads from environment variables or a TOML file and fails fast if the
//! endpoint is missing or malformed. The API token is wrapped in
//! `secrecy::SecretString` to prevent log leaks.

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Where build events are posted and the key that authorizes them.
#[derive(Debug)]
pub struct EndpointConfig {
    pub url: String,
    pub token: SecretString,
}

impl EndpointConfig {
    /// Validates `url` and rejects an empty token.
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let token = token.into();
        validate_api_url(&url)?;
        if token.trim().is_empty() {
            return Err(Error::Config("api token is empty".to_string()));
        }
        Ok(Self {
            url,
            token: SecretString::from(token),
        })
    }
}

impl Clone for EndpointConfig {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            token: SecretString::from(self.token.expose_secret().to_owned()),
        }
    }
}

/// Supplies the endpoint at dispatch time.
///
/// Resolved once per dispatched event, so a provider backed by mutable
/// storage sees updates without restarting anything.
pub trait EndpointProvider: Send + Sync {
    fn endpoint(&self) -> Result<EndpointConfig>;
}

/// A fixed endpoint.
#[derive(Debug, Clone)]
pub struct StaticEndpoint(EndpointConfig);

impl StaticEndpoint {
    pub fn new(endpoint: EndpointConfig) -> Self {
        Self(endpoint)
    }
}

impl EndpointProvider for StaticEndpoint {
    fn endpoint(&self) -> Result<EndpointConfig> {
        Ok(self.0.clone())
    }
}

/// Process configuration.
#[derive(Debug)]
pub struct Config {
    pub endpoint: EndpointConfig,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            endpoint: EndpointConfig::new(
                required_var("BUILD_EVENTS_API_URL")?,
                required_var("BUILD_EVENTS_API_TOKEN")?,
            )?,
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        let telemetry = file.telemetry.unwrap_or_default();
        Ok(Self {
            endpoint: EndpointConfig::new(file.endpoint.url, file.endpoint.token)?,
            otel_endpoint: telemetry.otel_endpoint,
            log_level: telemetry.log_level.unwrap_or_else(|| "info".to_string()),
        })
    }
}

impl EndpointProvider for Config {
    fn endpoint(&self) -> Result<EndpointConfig> {
        Ok(self.endpoint.clone())
    }
}

/// Accept only absolute `http`/`https` URLs.
pub fn validate_api_url(url: &str) -> Result<()> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| Error::Config(format!("invalid api url {url:?}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(Error::Config(format!(
            "invalid api url {url:?}: unsupported scheme {other}"
        ))),
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    endpoint: EndpointSection,
    telemetry: Option<TelemetrySection>,
}

#[derive(Debug, Deserialize)]
struct EndpointSection {
    url: String,
    token: String,
}

#[derive(Debug, Default, Deserialize)]
struct TelemetrySection {
    otel_endpoint: Option<String>,
    log_level: Option<String>,
}
