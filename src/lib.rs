//! # GraphQL Mock Server
//!
//! Serves realistic mock responses for any GraphQL schema. Every query is
//! checked against the schema, then filled in by per-type mock rules.
//!
//! ## Features
//!
//! - **Schema driven**: objects, interfaces, unions, enums, custom scalars
//! - **Mock rules**: built-in scalar rules plus configurable per-type rules and object overrides
//! - **Null propagation**: non-null violations null the nearest nullable parent
//! - **Reproducible**: optional fixed seed
//! - **Metrics**: Prometheus metrics for monitoring
//! - **Health Checks**: Kubernetes-ready health endpoints
//!
//! ## Quick Start
//!
//! ```rust
//! use graphql_mock::adapters::mock_registry::MockRegistry;
//! use graphql_mock::adapters::mock_resolver::MockEngine;
//! use graphql_mock::domain::SchemaModel;
//!
//! let schema = SchemaModel::load("type Query { hello: String }")?;
//! let registry = MockRegistry::for_schema(&schema);
//! let engine = MockEngine::new(schema, registry).with_seed(Some(1));
//!
//! let response = engine.execute("{ hello }", None)?;
//! assert!(response.is_ok());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **Domain**: schema model, query selections, response values and errors
//! - **Adapters**: mock registry, resolution engine and HTTP handlers
//! - **Config**: configuration management

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;

use crate::adapters::graphql_handler::{self, GraphQLState};
use crate::adapters::health_handler::HealthHandler;
use crate::adapters::metrics_handler::MetricsHandler;
use crate::adapters::mock_resolver::MockEngine;
use axum::{routing::get, Router};
use std::sync::Arc;

/// Creates the Axum application router with all endpoints configured.
///
/// # Arguments
///
/// * `engine` - Mock engine holding the schema and rules
/// * `health_handler` - Health check handler
/// * `metrics_handler` - Metrics collection handler
pub fn create_app(
    engine: Arc<MockEngine>,
    health_handler: Arc<HealthHandler>,
    metrics_handler: Arc<MetricsHandler>,
) -> Router {
    let state = GraphQLState {
        engine,
        metrics: metrics_handler.collector().clone(),
    };

    let graphql_router = Router::new()
        .route(
            "/",
            get(graphql_handler::graphql_get).post(graphql_handler::graphql_post),
        )
        .route(
            "/graphql",
            get(graphql_handler::graphql_get).post(graphql_handler::graphql_post),
        )
        .route("/schema", get(graphql_handler::schema_sdl))
        .with_state(state);

    let router = Router::new()
        // Health check endpoints
        .route("/health", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.health().await }
            }
        }))
        .route("/health/ready", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.ready().await }
            }
        }))
        .route("/health/live", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.live().await }
            }
        }))
        .route("/metrics", get({
            let handler = metrics_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.metrics().await }
            }
        }))
        .merge(graphql_router);

    router.layer(
        tower_http::cors::CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
    )
}
