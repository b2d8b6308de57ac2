//! HTTP surface for GraphQL requests
//!
//! Accepts the usual POST JSON body and the GET query-string form. Parse and
//! validation failures answer 400, executed operations answer 200 even when
//! the response carries non-null violations.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::adapters::metrics_handler::MetricsCollector;
use crate::adapters::mock_resolver::MockEngine;
use crate::domain::Response;

/// Shared state for GraphQL handlers
#[derive(Clone)]
pub struct GraphQLState {
    pub engine: Arc<MockEngine>,
    pub metrics: Arc<MetricsCollector>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(default, rename = "operationName")]
    pub operation_name: Option<String>,
    /// Accepted for compatibility, arguments do not influence mock values
    #[serde(default)]
    pub variables: Option<Value>,
}

/// GET form, where `variables` arrives as a JSON encoded string
#[derive(Debug, Deserialize)]
pub struct GraphQLQueryParams {
    pub query: String,
    #[serde(default, rename = "operationName")]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub variables: Option<String>,
}

impl From<GraphQLQueryParams> for GraphQLRequest {
    fn from(params: GraphQLQueryParams) -> Self {
        Self {
            query: params.query,
            operation_name: params.operation_name.filter(|name| !name.is_empty()),
            variables: params
                .variables
                .and_then(|raw| serde_json::from_str(&raw).ok()),
        }
    }
}

pub async fn graphql_post(
    State(state): State<GraphQLState>,
    Json(request): Json<GraphQLRequest>,
) -> impl IntoResponse {
    execute(&state, request)
}

pub async fn graphql_get(
    State(state): State<GraphQLState>,
    Query(params): Query<GraphQLQueryParams>,
) -> impl IntoResponse {
    execute(&state, params.into())
}

/// Serves the loaded SDL as plain text
pub async fn schema_sdl(State(state): State<GraphQLState>) -> impl IntoResponse {
    (
        [(axum::http::header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.engine.schema().sdl().to_string(),
    )
}

fn execute(state: &GraphQLState, request: GraphQLRequest) -> (StatusCode, Json<Response>) {
    let started = Instant::now();
    let engine = &state.engine;

    let (operation, status, response) =
        match engine.prepare(&request.query, request.operation_name.as_deref()) {
            Ok(operation) => {
                let response = engine.run(&operation, &mut engine.rng());
                (operation.kind.as_str(), StatusCode::OK, response)
            }
            Err(err) => {
                tracing::debug!(code = err.code(), "rejected GraphQL request: {}", err);
                ("unknown", StatusCode::BAD_REQUEST, Response::from_query_error(&err))
            }
        };

    state.metrics.observe_request(
        operation,
        status.as_u16(),
        started.elapsed().as_secs_f64(),
        if status == StatusCode::OK { response.errors.len() } else { 0 },
    );
    if !response.errors.is_empty() && status == StatusCode::OK {
        tracing::debug!(errors = response.errors.len(), "response contains field errors");
    }

    (status, Json(response))
}
