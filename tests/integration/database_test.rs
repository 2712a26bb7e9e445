//! End-to-end tests of the `Database` handle over HTTP.

use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use futures::future::join_all;
use httpsql::config::ClientOptions;
use httpsql::db::{Database, Value, PROBE_QUERY};
use httpsql::error::HttpSqlError;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;

use super::common::TestEndpoint;

const TYPED_SQL: &str = "SELECT * FROM typed";

fn typed_body() -> serde_json::Value {
    json!({
        "meta": [
            {"name": "id", "type": "BIGINT"},
            {"name": "day", "type": "DATE"},
            {"name": "at", "type": "TIMESTAMP"},
            {"name": "clock", "type": "TIME"},
            {"name": "payload", "type": "BLOB"},
            {"name": "tags", "type": "VARCHAR[]"},
            {"name": "note", "type": "VARCHAR"}
        ],
        "data": [
            ["9223372036854775807", "2024-01-15", "2024-01-15 10:30:00", "10:30:00.5",
             "AAEC", "[\"a\", \"b\"]", null],
            ["-1", "1970-01-01", "1970-01-01 00:00:00", "00:00:00", "", "[]", "x"]
        ],
        "rows": 2,
        "statistics": {"elapsed": 0.002, "rows_read": 2, "bytes_read": 64}
    })
}

#[tokio::test]
async fn test_connect_issues_probe() {
    let endpoint = TestEndpoint::new().start().await;

    let db = Database::connect(ClientOptions::new(&endpoint.base_url))
        .await
        .unwrap();

    assert_eq!(endpoint.count(PROBE_QUERY), 1);
    assert_eq!(
        db.options().map(|o| o.base_url.as_str()),
        Some(endpoint.base_url.as_str())
    );
}

#[tokio::test]
async fn test_connect_fails_when_probe_is_rejected() {
    let endpoint = TestEndpoint::new().require_key("secret").start().await;

    let result =
        Database::connect(ClientOptions::new(&endpoint.base_url).with_api_key("wrong")).await;

    match result {
        Err(err) => assert_eq!(err.status(), Some(401)),
        Ok(_) => panic!("connect should fail when the probe is rejected"),
    }
}

#[tokio::test]
async fn test_all_decodes_typed_rows() {
    let endpoint = TestEndpoint::new().respond(TYPED_SQL, typed_body()).start().await;
    let db = Database::connect(ClientOptions::new(&endpoint.base_url))
        .await
        .unwrap();

    let table = db.all(TYPED_SQL).await.unwrap();

    assert_eq!(table.len(), 2);
    let first = &table[0];
    assert_eq!(
        first["id"].as_bigint().unwrap().to_string(),
        "9223372036854775807"
    );
    assert_eq!(
        first["day"].date_as_utc_instant(),
        Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
    );
    assert_eq!(
        first["at"].as_timestamp(),
        Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
    );
    assert_eq!(first["clock"], Value::Time("10:30:00.5".to_string()));
    assert_eq!(first["payload"], Value::Bytes(vec![0, 1, 2]));
    assert_eq!(
        first["tags"],
        Value::List(vec![Value::from("a"), Value::from("b")])
    );
    assert_eq!(first["note"], Value::Null);

    let second = &table[1];
    assert_eq!(second["id"].as_bigint().unwrap().to_string(), "-1");
    assert_eq!(second["payload"], Value::Bytes(Vec::new()));
    assert_eq!(second["tags"], Value::List(Vec::new()));
}

#[tokio::test]
async fn test_each_follows_wire_row_order() {
    let body = json!({
        "meta": [{"name": "n", "type": "INTEGER"}],
        "data": [[5], [3], [9], [1]],
        "rows": 4,
        "statistics": {"elapsed": 0.0, "rows_read": 4, "bytes_read": 16}
    });
    let endpoint = TestEndpoint::new().respond("SELECT n", body).start().await;
    let db = Database::connect(ClientOptions::new(&endpoint.base_url))
        .await
        .unwrap();

    let mut seen = Vec::new();
    db.each("SELECT n", |row| seen.push(row["n"].as_f64().unwrap()))
        .await
        .unwrap();

    assert_eq!(seen, vec![5.0, 3.0, 9.0, 1.0]);
}

#[tokio::test]
async fn test_concurrent_identical_queries_make_one_request() {
    let endpoint = TestEndpoint::new()
        .respond(TYPED_SQL, typed_body())
        .latency(Duration::from_millis(100))
        .start()
        .await;
    let db = Database::connect(ClientOptions::new(&endpoint.base_url))
        .await
        .unwrap();

    let results = join_all((0..8).map(|_| db.all(TYPED_SQL))).await;

    assert_eq!(endpoint.count(TYPED_SQL), 1);
    assert!(results.iter().all(|r| r.as_ref().map(|t| t.len()) == Ok(2)));
}

#[tokio::test]
async fn test_concurrent_failures_are_shared() {
    let endpoint = TestEndpoint::new()
        .fail("SELEC 1", StatusCode::INTERNAL_SERVER_ERROR, "syntax error")
        .latency(Duration::from_millis(100))
        .start()
        .await;
    let db = Database::connect(ClientOptions::new(&endpoint.base_url))
        .await
        .unwrap();

    let results = join_all((0..4).map(|_| db.exec("SELEC 1"))).await;

    assert_eq!(endpoint.count("SELEC 1"), 1);
    for result in results {
        assert_eq!(result, Err(HttpSqlError::transport(500, "syntax error")));
    }
}

#[tokio::test]
async fn test_cache_ttl_avoids_repeat_requests() {
    let endpoint = TestEndpoint::new().start().await;
    let options =
        ClientOptions::new(&endpoint.base_url).with_cache_ttl(Duration::from_secs(60));
    let db = Database::connect(options).await.unwrap();

    // The probe already cached "SELECT 1".
    db.all("SELECT 1").await.unwrap();
    db.run("SELECT 2").await.unwrap();
    db.run("SELECT 2").await.unwrap();

    assert_eq!(endpoint.count("SELECT 1"), 1);
    assert_eq!(endpoint.count("SELECT 2"), 1);
}

#[tokio::test]
async fn test_without_ttl_every_call_is_a_request() {
    let endpoint = TestEndpoint::new().start().await;
    let db = Database::connect(ClientOptions::new(&endpoint.base_url))
        .await
        .unwrap();

    for _ in 0..3 {
        db.all("SELECT 2").await.unwrap();
    }

    assert_eq!(endpoint.count("SELECT 2"), 3);
}
