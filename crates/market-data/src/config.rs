//! Configuration for the market data layer.
//!
//! Settings are plain serde structs so they can come from a JSON file, from
//! the environment, or be built in code. Field names are camelCase on the wire.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fetch::RetryPolicy;

/// Env var pointing at a JSON config file.
pub const CONFIG_FILE_ENV: &str = "MD_CONFIG_FILE";

const DEFAULT_HEALTH_CHECK_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid retry policy for {scope}: {message}")]
    InvalidRetryPolicy { scope: String, message: String },
}

/// Top-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketDataConfig {
    /// Default retry policy for the shared fetcher.
    pub retry: RetryPolicy,
    /// Per-probe timeout for registry health checks.
    pub health_check_timeout_ms: u64,
    /// Per-attempt HTTP timeout.
    pub request_timeout_ms: u64,
    /// Providers to register, in registration order.
    pub providers: Vec<ProviderConfig>,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            health_check_timeout_ms: DEFAULT_HEALTH_CHECK_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            providers: Vec::new(),
        }
    }
}

impl MarketDataConfig {
    /// Parse settings from a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings from the process environment.
    ///
    /// Reads the JSON file named by `MD_CONFIG_FILE` when set, then applies
    /// the scalar `MD_*` overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_FILE_ENV) {
            Ok(path) => {
                let path = PathBuf::from(path);
                let contents = std::fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Io { path, source })?;
                Self::from_json_str(&contents)?
            }
            Err(_) => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Check the shared retry policy and every per-provider override.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.retry
            .validate()
            .map_err(|e| ConfigError::InvalidRetryPolicy {
                scope: "retry".to_string(),
                message: e.to_string(),
            })?;

        for provider in &self.providers {
            if let Some(policy) = &provider.retry {
                policy
                    .validate()
                    .map_err(|e| ConfigError::InvalidRetryPolicy {
                        scope: format!("provider '{}'", provider.name),
                        message: e.to_string(),
                    })?;
            }
        }

        Ok(())
    }

    /// Apply scalar overrides from a key lookup (normally the environment).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_override(&lookup, "MD_RETRY_MAX_ATTEMPTS") {
            self.retry.max_attempts = v;
        }
        if let Some(v) = parse_override(&lookup, "MD_RETRY_INITIAL_DELAY_MS") {
            self.retry.initial_delay_ms = v;
        }
        if let Some(v) = parse_override(&lookup, "MD_RETRY_MAX_DELAY_MS") {
            self.retry.max_delay_ms = v;
        }
        if let Some(v) = parse_override(&lookup, "MD_RETRY_BACKOFF_FACTOR") {
            self.retry.backoff_factor = v;
        }
        if let Some(v) = parse_override(&lookup, "MD_HEALTH_TIMEOUT_MS") {
            self.health_check_timeout_ms = v;
        }
        if let Some(v) = parse_override(&lookup, "MD_REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms = v;
        }
    }

    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_millis(self.health_check_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_override<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparseable value for {}: '{}'", key, raw);
            None
        }
    }
}

fn default_api_key_param() -> String {
    "apikey".to_string()
}

fn default_quote_path() -> String {
    "/quote".to_string()
}

fn default_history_path() -> String {
    "/history".to_string()
}

fn default_search_path() -> String {
    "/search".to_string()
}

fn default_health_path() -> String {
    "/health".to_string()
}

/// Settings for one HTTP provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Unique provider name (registry key).
    pub name: String,

    /// Higher = preferred.
    #[serde(default)]
    pub priority: i32,

    /// Endpoint root, e.g. `https://api.example.com/v1`.
    pub base_url: String,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Query parameter carrying the API key.
    #[serde(default = "default_api_key_param")]
    pub api_key_param: String,

    /// Send the API key in this header instead of the query string.
    #[serde(default)]
    pub api_key_header: Option<String>,

    #[serde(default = "default_quote_path")]
    pub quote_path: String,

    #[serde(default = "default_history_path")]
    pub history_path: String,

    #[serde(default = "default_search_path")]
    pub search_path: String,

    #[serde(default = "default_health_path")]
    pub health_path: String,

    #[serde(default)]
    pub supports_search: bool,

    /// Overrides the shared fetcher's default policy for this provider.
    #[serde(default)]
    pub retry: Option<RetryPolicy>,
}

impl ProviderConfig {
    /// Config with default paths and no API key.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
            base_url: base_url.into(),
            api_key: None,
            api_key_param: default_api_key_param(),
            api_key_header: None,
            quote_path: default_quote_path(),
            history_path: default_history_path(),
            search_path: default_search_path(),
            health_path: default_health_path(),
            supports_search: false,
            retry: None,
        }
    }
}
