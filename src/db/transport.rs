//! HTTP transport for the query endpoint.
//!
//! One call is one GET round trip: the SQL text travels as the `query`
//! parameter and the output format is pinned to compact columnar JSON.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::types::WireResult;
use crate::config::ClientOptions;
use crate::error::{HttpSqlError, Result};

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Query parameter carrying the SQL text.
const QUERY_PARAM: &str = "query";

/// Query parameter selecting the response format.
const FORMAT_PARAM: &str = "default_format";

/// Compact columnar JSON: `{meta, data, rows, statistics}`.
const RESPONSE_FORMAT: &str = "JSONCompact";

/// Trait defining a single round trip to a query endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `sql` and returns the undecoded result.
    async fn query(&self, sql: &str) -> Result<WireResult>;
}

/// Transport backed by a reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpTransport {
    /// Creates a transport for the given options.
    ///
    /// The base URL is validated and stored without trailing slashes. No
    /// retries are configured; a timeout is only set when the options ask
    /// for one.
    pub fn new(options: &ClientOptions) -> Result<Self> {
        options.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| HttpSqlError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            base_url: options.normalized_base_url().to_string(),
            api_key: options.api_key.clone(),
            client,
        })
    }

    /// Returns the normalized base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> String {
        format!("{}/", self.base_url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn query(&self, sql: &str) -> Result<WireResult> {
        debug!("Sending query to {}", self.base_url);

        let mut request = self
            .client
            .get(self.endpoint())
            .query(&[(QUERY_PARAM, sql), (FORMAT_PARAM, RESPONSE_FORMAT)]);

        if let Some(api_key) = &self.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                HttpSqlError::network(format!("Request timed out: {e}"))
            } else if e.is_connect() {
                HttpSqlError::network(format!("Failed to connect to {}: {e}", self.base_url))
            } else {
                HttpSqlError::network(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| HttpSqlError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            warn!("Query endpoint returned {}", status);
            return Err(HttpSqlError::transport(status.as_u16(), body));
        }

        serde_json::from_str(&body)
            .map_err(|e| HttpSqlError::decode(format!("Failed to parse response: {e}")))
    }
}
