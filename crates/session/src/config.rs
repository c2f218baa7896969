//! Session engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PELICAN_API_URL` - Base URL of the wallet backend API
//! - `PELICAN_EXCHANGE_ORIGIN` - Origin of the exchange site (account linking)
//!
//! ## Optional
//! - `PELICAN_REQUEST_TIMEOUT_SECS` - HTTP request timeout (default: 30)

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Session engine configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base URL of the wallet backend API.
    pub api_url: Url,
    /// Origin of the exchange site, used to build account-linking URLs.
    pub exchange_origin: Url,
    /// Timeout applied to every backend request.
    pub request_timeout: Duration,
}

impl SessionConfig {
    /// Create a configuration with the default request timeout.
    #[must_use]
    pub const fn new(api_url: Url, exchange_origin: Url) -> Self {
        Self {
            api_url,
            exchange_origin,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = get_required_url("PELICAN_API_URL")?;
        let exchange_origin = get_required_url("PELICAN_EXCHANGE_ORIGIN")?;
        let request_timeout_secs = match get_optional_env("PELICAN_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar("PELICAN_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url,
            exchange_origin,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get a required environment variable parsed as a URL.
fn get_required_url(key: &str) -> Result<Url, ConfigError> {
    let raw = get_required_env(key)?;
    Url::parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_applies_default_timeout() {
        let config = SessionConfig::new(
            Url::parse("https://api.pelican.example").unwrap(),
            Url::parse("https://exchange.pelican.example").unwrap(),
        );
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_missing_env_var_is_reported_by_name() {
        let error = get_required_env("PELICAN_TEST_DOES_NOT_EXIST").unwrap_err();
        assert!(error.to_string().contains("PELICAN_TEST_DOES_NOT_EXIST"));
    }
}
