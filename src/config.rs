//! Configuration management for httpsql.
//!
//! Handles the options a connection handle is built from, plus loading named
//! connections from a TOML file and environment variables.

use crate::error::{HttpSqlError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Environment variable holding the endpoint base URL.
pub const ENV_URL: &str = "HTTPSQL_URL";

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "HTTPSQL_API_KEY";

/// Environment variable holding the cache TTL in milliseconds.
pub const ENV_CACHE_TTL_MS: &str = "HTTPSQL_CACHE_TTL_MS";

/// Options a [`Database`](crate::db::Database) handle is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    /// Base URL of the query endpoint.
    pub base_url: String,

    /// API key sent with every request, if any.
    pub api_key: Option<String>,

    /// How long decoded results stay cached. `None` or zero disables caching.
    pub cache_ttl: Option<Duration>,

    /// Request timeout handed to the HTTP client.
    pub timeout: Option<Duration>,
}

impl ClientOptions {
    /// Creates options for the given base URL with caching disabled.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            cache_ttl: None,
            timeout: None,
        }
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Returns the cache TTL if caching is enabled.
    pub fn effective_cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl.filter(|ttl| !ttl.is_zero())
    }

    /// Returns the base URL with trailing slashes stripped.
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Validates the base URL, returning it parsed.
    pub fn validate(&self) -> Result<Url> {
        let base = self.normalized_base_url();
        if base.is_empty() {
            return Err(HttpSqlError::config("base_url is required"));
        }

        let url = Url::parse(base)
            .map_err(|e| HttpSqlError::config(format!("Invalid base_url '{base}': {e}")))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(HttpSqlError::config(format!(
                "Invalid scheme '{}'. Expected 'http' or 'https'",
                url.scheme()
            )));
        }

        Ok(url)
    }
}

/// Main configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Named connections.
    #[serde(default)]
    pub connections: HashMap<String, ConnectionConfig>,
}

/// A connection as written in the config file. Every field is optional so
/// that CLI arguments and the environment can fill the gaps.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Endpoint base URL.
    pub base_url: Option<String>,

    /// API key (not recommended to store in config).
    pub api_key: Option<String>,

    /// Cache TTL in milliseconds; 0 disables caching.
    pub cache_ttl_ms: Option<u64>,

    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl ConnectionConfig {
    /// Merges another config into this one, with the other taking precedence.
    pub fn merge(&mut self, other: &ConnectionConfig) {
        if other.base_url.is_some() {
            self.base_url = other.base_url.clone();
        }
        if other.api_key.is_some() {
            self.api_key = other.api_key.clone();
        }
        if other.cache_ttl_ms.is_some() {
            self.cache_ttl_ms = other.cache_ttl_ms;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
    }

    /// Applies `HTTPSQL_*` environment variables as defaults.
    pub fn apply_env_defaults(&mut self) {
        if self.base_url.is_none() {
            self.base_url = std::env::var(ENV_URL).ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var(ENV_API_KEY).ok();
        }
        if self.cache_ttl_ms.is_none() {
            if let Ok(ttl) = std::env::var(ENV_CACHE_TTL_MS) {
                self.cache_ttl_ms = ttl.parse().ok();
            }
        }
    }

    /// Converts to client options. Fails when no base URL is set.
    pub fn to_client_options(&self) -> Result<ClientOptions> {
        let base_url = self
            .base_url
            .clone()
            .ok_or_else(|| HttpSqlError::config("base_url is required"))?;

        Ok(ClientOptions {
            base_url,
            api_key: self.api_key.clone(),
            cache_ttl: self.cache_ttl_ms.map(Duration::from_millis),
            timeout: self.timeout_secs.map(Duration::from_secs),
        })
    }

    /// Returns a display-safe string (no API key) for log output.
    pub fn display_string(&self) -> String {
        let url = self.base_url.as_deref().unwrap_or("<no url>");
        if self.api_key.is_some() {
            format!("{url} (api key set)")
        } else {
            url.to_string()
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("httpsql")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| HttpSqlError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            HttpSqlError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Gets a named connection, or the default connection if name is None.
    pub fn get_connection(&self, name: Option<&str>) -> Option<&ConnectionConfig> {
        let key = name.unwrap_or("default");
        self.connections.get(key)
    }
}
