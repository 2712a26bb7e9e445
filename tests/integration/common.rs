//! A scripted query endpoint served by axum.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::Router;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the endpoint saw for one request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub query: Option<String>,
    pub format: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Clone, Default)]
struct EndpointState {
    responses: Arc<HashMap<String, (StatusCode, String)>>,
    required_key: Option<String>,
    latency: Option<Duration>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Builder for a scripted endpoint.
#[derive(Default)]
pub struct TestEndpoint {
    responses: HashMap<String, (StatusCode, String)>,
    required_key: Option<String>,
    latency: Option<Duration>,
}

/// A running endpoint.
pub struct RunningEndpoint {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl TestEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `sql` with a 200 and the given JSON body.
    pub fn respond(mut self, sql: &str, body: serde_json::Value) -> Self {
        self.responses
            .insert(sql.to_string(), (StatusCode::OK, body.to_string()));
        self
    }

    /// Answers `sql` with the given status and plain-text body.
    pub fn fail(mut self, sql: &str, status: StatusCode, body: &str) -> Self {
        self.responses
            .insert(sql.to_string(), (status, body.to_string()));
        self
    }

    /// Rejects requests without this API key with a 401.
    pub fn require_key(mut self, key: &str) -> Self {
        self.required_key = Some(key.to_string());
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub async fn start(self) -> RunningEndpoint {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = EndpointState {
            responses: Arc::new(self.responses),
            required_key: self.required_key,
            latency: self.latency,
            requests: Arc::clone(&requests),
        };

        let router = Router::new().route("/", get(handle_query)).with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        RunningEndpoint {
            base_url: format!("http://{addr}"),
            requests,
        }
    }
}

impl RunningEndpoint {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests received for `sql`.
    pub fn count(&self, sql: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.query.as_deref() == Some(sql))
            .count()
    }
}

/// Body for a single INTEGER column named `1` holding 1.
pub fn probe_body() -> serde_json::Value {
    json!({
        "meta": [{"name": "1", "type": "INTEGER"}],
        "data": [[1]],
        "rows": 1,
        "statistics": {"elapsed": 0.0001, "rows_read": 1, "bytes_read": 1}
    })
}

async fn handle_query(
    State(state): State<EndpointState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    let request = RecordedRequest {
        query: params.get("query").cloned(),
        format: params.get("default_format").cloned(),
        api_key: headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
    };
    state.requests.lock().unwrap().push(request.clone());

    if let Some(latency) = state.latency {
        tokio::time::sleep(latency).await;
    }

    if let Some(required) = &state.required_key {
        if request.api_key.as_deref() != Some(required.as_str()) {
            return (StatusCode::UNAUTHORIZED, "invalid api key".to_string());
        }
    }

    let sql = request.query.unwrap_or_default();
    match state.responses.get(&sql) {
        Some(response) => response.clone(),
        None => (StatusCode::OK, probe_body().to_string()),
    }
}
