use super::common;

use common::test_server::TestServer;
use serde_json::{json, Value};

async fn get_json(server: &TestServer, path: &str) -> (u16, Value) {
    let response = reqwest::get(server.url(path)).await.unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_health_reports_registered_rules() {
    let server = TestServer::with_registry(|r| {
        r.register_fn("Money", |_, _| json!(1.5));
        r.register_fn("UserProfileType", |_, _| json!({"fullName": "John Doe"}));
    })
    .await;

    let (status, body) = get_json(&server, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["mock_rules"], 2);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_ready_with_query_fields() {
    let server = TestServer::new().await;
    let (status, body) = get_json(&server, "/health/ready").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_not_ready_with_empty_query_root() {
    let server = TestServer::with_schema("type Query", |_| {}).await;
    let (status, body) = get_json(&server, "/health/ready").await;
    assert_eq!(status, 503);
    assert_eq!(body["status"], "not_ready");

    // Liveness does not depend on the schema.
    let (status, _) = get_json(&server, "/health/live").await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_metrics_track_operations_and_field_errors() {
    let server = TestServer::with_registry(|r| r.register_fn("String", |_, _| Value::Null)).await;
    let client = reqwest::Client::new();

    for query in ["{ me { name } }", "mutation { rename(name: \"x\") { id } }", "{ nope }"] {
        client
            .post(server.url("/graphql"))
            .json(&json!({ "query": query }))
            .send()
            .await
            .unwrap();
    }

    let body = reqwest::get(server.url("/metrics"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("graphql_mock_requests_total{operation=\"query\",status=\"200\"} 1"));
    assert!(body.contains("graphql_mock_requests_total{operation=\"mutation\",status=\"200\"} 1"));
    assert!(body.contains("graphql_mock_requests_total{operation=\"unknown\",status=\"400\"} 1"));
    assert!(body.contains("graphql_mock_field_errors_total 1"));
}
