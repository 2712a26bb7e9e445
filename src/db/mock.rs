//! Mock transports for testing.
//!
//! Provides in-memory endpoints that return scripted results and record
//! every round trip they receive.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use super::transport::Transport;
use super::types::{ColumnMeta, WireResult};
use crate::error::{HttpSqlError, Result};

/// A mock transport that returns predefined results.
///
/// Unknown SQL gets a single `result` column holding `Mock result for: <sql>`.
#[derive(Default)]
pub struct MockTransport {
    responses: HashMap<String, Result<WireResult>>,
    latency: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl MockTransport {
    /// Creates a mock transport with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the result returned for `sql`.
    pub fn with_response(mut self, sql: impl Into<String>, result: WireResult) -> Self {
        self.responses.insert(sql.into(), Ok(result));
        self
    }

    /// Scripts a failure for `sql`.
    pub fn with_error(mut self, sql: impl Into<String>, error: HttpSqlError) -> Self {
        self.responses.insert(sql.into(), Err(error));
        self
    }

    /// Delays every response, simulating a slow round trip.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of round trips received for `sql`.
    pub fn call_count(&self, sql: &str) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.iter().filter(|c| *c == sql).count())
            .unwrap_or_default()
    }

    /// Number of round trips received in total.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or_default()
    }

    fn default_result(sql: &str) -> WireResult {
        WireResult::with_data(
            vec![ColumnMeta::new("result", "VARCHAR")],
            vec![vec![json!(format!("Mock result for: {sql}"))]],
        )
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn query(&self, sql: &str) -> Result<WireResult> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(sql.to_string());
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        match self.responses.get(sql) {
            Some(result) => result.clone(),
            None => Ok(Self::default_result(sql)),
        }
    }
}

/// A transport whose every round trip fails with the same error.
pub struct FailingTransport {
    error: HttpSqlError,
}

impl FailingTransport {
    /// Fails with a network error, as an unreachable endpoint would.
    pub fn new() -> Self {
        Self::with_error(HttpSqlError::network("Mock connection failure"))
    }

    pub fn with_error(error: HttpSqlError) -> Self {
        Self { error }
    }
}

impl Default for FailingTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for FailingTransport {
    async fn query(&self, _sql: &str) -> Result<WireResult> {
        Err(self.error.clone())
    }
}
