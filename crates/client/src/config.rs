//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SPROUT_API_URL` - Base URL of the shop REST API (e.g., <https://shop.example.com/api/>)
//!
//! ## Optional
//! - `SPROUT_STORAGE_PATH` - Path of the durable storage file (default: `sprout-state.json`)
//! - `SPROUT_HTTP_TIMEOUT_SECS` - Fixed request timeout in seconds (default: 10)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default request timeout, matching the transport contract (10s, no
/// cancellation beyond it).
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default durable storage file, relative to the working directory.
const DEFAULT_STORAGE_PATH: &str = "sprout-state.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Shop client configuration.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// Base URL of the REST API. Always ends with a trailing slash so
    /// endpoint paths can be appended directly.
    pub base_url: Url,
    /// Fixed per-request timeout enforced by the transport.
    pub timeout: Duration,
    /// Path of the durable local storage file (tokens + favorites cache).
    pub storage_path: PathBuf,
}

impl ShopConfig {
    /// Create a configuration from explicit values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not a valid URL.
    pub fn new(
        base_url: &str,
        storage_path: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let base_url = parse_base_url(base_url)?;
        Ok(Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            storage_path: storage_path.into(),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails
    /// to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url = required_env("SPROUT_API_URL")?;
        let storage_path = std::env::var("SPROUT_STORAGE_PATH")
            .unwrap_or_else(|_| DEFAULT_STORAGE_PATH.to_string());
        let timeout_secs = match std::env::var("SPROUT_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("SPROUT_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        let mut config = Self::new(&base_url, storage_path)?;
        config.timeout = Duration::from_secs(timeout_secs);
        Ok(config)
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

/// Parse and normalize the base URL: it must be absolute and is given a
/// trailing slash so `Url::join`-free path appending stays correct.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };

    Url::parse(&normalized)
        .map_err(|e| ConfigError::InvalidEnvVar("SPROUT_API_URL".to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ShopConfig::new("https://shop.example.com/api", "state.json").unwrap();
        assert_eq!(config.base_url.as_str(), "https://shop.example.com/api/");
    }

    #[test]
    fn test_trailing_slash_preserved() {
        let config = ShopConfig::new("https://shop.example.com/api/", "state.json").unwrap();
        assert_eq!(config.base_url.as_str(), "https://shop.example.com/api/");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = ShopConfig::new("not a url", "state.json").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(name, _) if name == "SPROUT_API_URL"));
    }

    #[test]
    fn test_default_timeout() {
        let config = ShopConfig::new("http://localhost:8000/api", "state.json").unwrap();
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
