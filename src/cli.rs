//! Command-line argument parsing for the httpsql binary.

use clap::Parser;
use httpsql::config::{Config, ConnectionConfig};
use std::path::PathBuf;

/// Run SQL against an HTTP query endpoint and print typed rows as JSON.
#[derive(Parser, Debug)]
#[command(name = "httpsql")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQL statement to run
    #[arg(value_name = "SQL")]
    pub sql: String,

    /// Endpoint base URL (e.g., http://localhost:9999)
    #[arg(short = 'u', long, value_name = "URL")]
    pub url: Option<String>,

    /// API key sent with every request
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Cache TTL in milliseconds (0 disables caching)
    #[arg(long, value_name = "MS")]
    pub cache_ttl_ms: Option<u64>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Use named connection from config
    #[arg(short = 'c', long, value_name = "NAME")]
    pub connection: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run the statement for its side effects and print nothing
    #[arg(long)]
    pub exec: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Connection settings given on the command line only.
    pub fn to_connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            base_url: self.url.clone(),
            api_key: self.api_key.clone(),
            cache_ttl_ms: self.cache_ttl_ms,
            timeout_secs: self.timeout_secs,
        }
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Returns the named connection to use, if specified.
    pub fn connection_name(&self) -> Option<&str> {
        self.connection.as_deref()
    }
}
