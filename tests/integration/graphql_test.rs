use super::common;

use common::test_server::TestServer;
use serde_json::{json, Value};

async fn post(server: &TestServer, path: &str, body: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(server.url(path))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_post_query_on_graphql_path() {
    let server = TestServer::new().await;
    let (status, body) = post(
        &server,
        "/graphql",
        json!({"query": "{ me { id name age role } tags }"}),
    )
    .await;

    assert_eq!(status, 200);
    assert!(body.get("errors").is_none());
    let me = &body["data"]["me"];
    assert!(me["id"].is_string());
    assert!(me["name"].is_string());
    assert!(me["role"] == "ADMIN" || me["role"] == "MEMBER");
    assert_eq!(body["data"]["tags"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_post_query_on_root_path() {
    let server = TestServer::new().await;
    let (status, body) = post(&server, "/", json!({"query": "{ tags }"})).await;
    assert_eq!(status, 200);
    assert!(body["data"]["tags"].is_array());
}

#[tokio::test]
async fn test_get_query() {
    let server = TestServer::new().await;
    let response = reqwest::Client::new()
        .get(server.url("/graphql"))
        .query(&[("query", "query Me { me { name } }"), ("operationName", "Me")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["data"]["me"]["name"].is_string());
}

#[tokio::test]
async fn test_unknown_field_is_bad_request() {
    let server = TestServer::new().await;
    let (status, body) = post(&server, "/graphql", json!({"query": "{ bogusField }"})).await;
    assert_eq!(status, 400);
    assert!(body.get("data").is_none());
    assert_eq!(body["errors"][0]["extensions"]["code"], "GRAPHQL_VALIDATION_FAILED");
    assert_eq!(
        body["errors"][0]["message"],
        "Cannot query field \"bogusField\" on type \"Query\""
    );

    // Later requests are unaffected.
    let (status, _) = post(&server, "/graphql", json!({"query": "{ tags }"})).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn test_syntax_error_is_bad_request() {
    let server = TestServer::new().await;
    let (status, body) = post(&server, "/graphql", json!({"query": "{ me { name "})).await;
    assert_eq!(status, 400);
    assert_eq!(body["errors"][0]["extensions"]["code"], "GRAPHQL_PARSE_FAILED");
}

#[tokio::test]
async fn test_non_null_violation_returns_partial_data() {
    let server = TestServer::with_registry(|r| r.register_fn("String", |_, _| Value::Null)).await;
    let (status, body) = post(&server, "/graphql", json!({"query": "{ me { name } }"})).await;

    assert_eq!(status, 200);
    assert_eq!(body["data"]["me"], Value::Null);
    let codes: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["extensions"]["code"].as_str().unwrap())
        .collect();
    assert!(codes.iter().all(|c| *c == "NON_NULL_VIOLATION"));
    assert_eq!(body["errors"][0]["path"], json!(["me", "name"]));
}

#[tokio::test]
async fn test_object_overrides() {
    let server = TestServer::with_registry(|r| {
        r.register_fn("UserProfileType", |_, _| json!({"fullName": "John Doe"}));
        r.register_fn("ImageType", |_, _| json!({"filePath": "https://picsum.photos/200/300"}));
    })
    .await;
    let (_, body) = post(
        &server,
        "/graphql",
        json!({"query": "{ me { profile { fullName avatar { filePath } } } }"}),
    )
    .await;

    let profile = &body["data"]["me"]["profile"];
    assert_eq!(profile["fullName"], "John Doe");
    assert_eq!(profile["avatar"]["filePath"], "https://picsum.photos/200/300");
}

#[tokio::test]
async fn test_union_and_fragments() {
    let server = TestServer::new().await;
    let query = r#"
        query Search { search { ...Result } }
        fragment Result on SearchResult {
            __typename
            ... on User { name }
            ... on Post { title }
        }
    "#;
    let (status, body) = post(&server, "/graphql", json!({"query": query})).await;
    assert_eq!(status, 200);
    for item in body["data"]["search"].as_array().unwrap() {
        match item["__typename"].as_str().unwrap() {
            "User" => assert!(item.get("name").is_some() && item.get("title").is_none()),
            "Post" => assert!(item.get("title").is_some() && item.get("name").is_none()),
            other => panic!("unexpected type {other}"),
        }
    }
}

#[tokio::test]
async fn test_mutation_with_arguments() {
    let server = TestServer::new().await;
    let (status, body) = post(
        &server,
        "/graphql",
        json!({"query": "mutation { rename(name: \"x\") { name } }"}),
    )
    .await;
    assert_eq!(status, 200);
    assert!(body["data"]["rename"]["name"].is_string());
}

#[tokio::test]
async fn test_seeded_server_is_reproducible() {
    let server = TestServer::new().await;
    let request = json!({"query": "{ me { id age balance } }"});
    let (_, first) = post(&server, "/graphql", request.clone()).await;
    let (_, second) = post(&server, "/graphql", request).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_schema_endpoint_serves_sdl() {
    let server = TestServer::new().await;
    let body = reqwest::get(server.url("/schema"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("type UserProfileType"));
}
