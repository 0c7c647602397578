//! Client Configuration
//!
//! Endpoint coordinates and transport tuning for [`DataStorage`](crate::storage::client::DataStorage).
//! Values come from defaults, a JSON file, or `DATA_STORAGE_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const ENV_URL: &str = "DATA_STORAGE_URL";
pub const ENV_DATABASE: &str = "DATA_STORAGE_DATABASE";
pub const ENV_COLLECTION: &str = "DATA_STORAGE_COLLECTION";
pub const ENV_PAGE_SIZE: &str = "DATA_STORAGE_PAGE_SIZE";
pub const ENV_TIMEOUT_MS: &str = "DATA_STORAGE_TIMEOUT_MS";
pub const ENV_RETRIES: &str = "DATA_STORAGE_RETRIES";
pub const ENV_TOKEN: &str = "DATA_STORAGE_TOKEN";

/// Upper bound the store accepts for `x-ms-max-item-count`.
pub const MAX_PAGE_SIZE: u32 = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataStorageConfig {
    /// Base URL of the document store, e.g. `https://account.documents.example.com`.
    pub base_url: String,
    pub database: String,
    pub collection: String,
    /// Page size used by `list` when the caller does not supply one.
    pub page_size: u32,
    pub timeout_ms: u64,
    /// Attempts per request made by the HTTP transport (1 = no retry).
    pub retry_attempts: usize,
    /// Opaque authorization token forwarded verbatim.
    pub auth_token: Option<String>,
}

impl Default for DataStorageConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            database: "db".to_string(),
            collection: "appcenter".to_string(),
            page_size: 100,
            timeout_ms: 5_000,
            retry_attempts: 3,
            auth_token: None,
        }
    }
}

impl DataStorageConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from defaults overridden by whatever `lookup` returns
    /// for the `DATA_STORAGE_*` keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_URL) {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(database) = lookup(ENV_DATABASE) {
            config.database = database;
        }
        if let Some(collection) = lookup(ENV_COLLECTION) {
            config.collection = collection;
        }
        if let Some(value) = lookup(ENV_PAGE_SIZE) {
            config.page_size = parse_value(ENV_PAGE_SIZE, value)?;
        }
        if let Some(value) = lookup(ENV_TIMEOUT_MS) {
            config.timeout_ms = parse_value(ENV_TIMEOUT_MS, value)?;
        }
        if let Some(value) = lookup(ENV_RETRIES) {
            config.retry_attempts = parse_value(ENV_RETRIES, value)?;
        }
        if let Some(token) = lookup(ENV_TOKEN) {
            if !token.is_empty() {
                config.auth_token = Some(token);
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".to_string()));
        }
        if self.database.is_empty() || self.collection.is_empty() {
            return Err(ConfigError::Invalid(
                "database and collection must not be empty".to_string(),
            ));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        if self.retry_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = DataStorageConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.page_size, 100);
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_lookup_overrides_defaults() {
        let config = DataStorageConfig::from_lookup(lookup_from(&[
            (ENV_URL, "https://store.example.com/"),
            (ENV_COLLECTION, "notes"),
            (ENV_PAGE_SIZE, "25"),
            (ENV_RETRIES, "1"),
            (ENV_TOKEN, "secret"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "https://store.example.com");
        assert_eq!(config.database, "db");
        assert_eq!(config.collection, "notes");
        assert_eq!(config.page_size, 25);
        assert_eq!(config.retry_attempts, 1);
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_unparsable_value_is_reported_with_key() {
        let err = DataStorageConfig::from_lookup(lookup_from(&[(ENV_TIMEOUT_MS, "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT_MS));
    }

    #[test]
    fn test_page_size_out_of_range_rejected() {
        assert!(DataStorageConfig::from_lookup(lookup_from(&[(ENV_PAGE_SIZE, "0")])).is_err());
        assert!(DataStorageConfig::from_lookup(lookup_from(&[(ENV_PAGE_SIZE, "5000")])).is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: DataStorageConfig =
            serde_json::from_str(r#"{"collection": "todo", "timeout_ms": 250}"#).unwrap();
        assert_eq!(config.collection, "todo");
        assert_eq!(config.timeout(), std::time::Duration::from_millis(250));
        assert_eq!(config.database, "db");
    }
}
