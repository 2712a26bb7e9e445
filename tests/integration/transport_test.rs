//! HTTP transport integration tests.
//!
//! Tests request shape, credentials and error mapping against a live socket.

use axum::http::StatusCode;
use httpsql::config::ClientOptions;
use httpsql::db::{HttpTransport, Transport};
use httpsql::error::HttpSqlError;

use super::common::TestEndpoint;

#[tokio::test]
async fn test_sends_sql_and_format_as_query_parameters() {
    let endpoint = TestEndpoint::new().start().await;
    let transport = HttpTransport::new(&ClientOptions::new(&endpoint.base_url)).unwrap();

    let sql = "SELECT 'a b&c=d', 1 + 1 AS \"sum\"";
    let wire = transport.query(sql).await.unwrap();

    assert_eq!(wire.rows, 1);
    let requests = endpoint.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query.as_deref(), Some(sql));
    assert_eq!(requests[0].format.as_deref(), Some("JSONCompact"));
    assert_eq!(requests[0].api_key, None);
}

#[tokio::test]
async fn test_attaches_api_key_header() {
    let endpoint = TestEndpoint::new().require_key("secret").start().await;
    let options = ClientOptions::new(format!("{}/", endpoint.base_url)).with_api_key("secret");
    let transport = HttpTransport::new(&options).unwrap();

    transport.query("SELECT 1").await.unwrap();

    assert_eq!(endpoint.requests()[0].api_key.as_deref(), Some("secret"));
}

#[tokio::test]
async fn test_non_success_status_carries_body_verbatim() {
    let endpoint = TestEndpoint::new()
        .fail("SELEC 1", StatusCode::INTERNAL_SERVER_ERROR, "syntax error")
        .start()
        .await;
    let transport = HttpTransport::new(&ClientOptions::new(&endpoint.base_url)).unwrap();

    let err = transport.query("SELEC 1").await.unwrap_err();

    assert_eq!(err, HttpSqlError::transport(500, "syntax error"));
}

#[tokio::test]
async fn test_missing_api_key_is_rejected() {
    let endpoint = TestEndpoint::new().require_key("secret").start().await;
    let transport = HttpTransport::new(&ClientOptions::new(&endpoint.base_url)).unwrap();

    let err = transport.query("SELECT 1").await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err, HttpSqlError::transport(401, "invalid api key"));
}
