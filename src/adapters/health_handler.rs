use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::adapters::mock_resolver::MockEngine;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthChecks {
    pub schema: String,
    pub mock_rules: usize,
}

pub struct HealthHandler {
    engine: Arc<MockEngine>,
    start_time: std::time::Instant,
}

impl HealthHandler {
    pub fn new(engine: Arc<MockEngine>) -> Self {
        Self {
            engine,
            start_time: std::time::Instant::now(),
        }
    }

    /// Basic health check - returns 200 if server is running
    pub async fn health(&self) -> impl IntoResponse {
        let status = HealthStatus {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            checks: HealthChecks {
                schema: "ok".to_string(),
                mock_rules: self.engine.registry().len(),
            },
        };

        (StatusCode::OK, Json(status))
    }

    /// Ready once the schema exposes at least one root field
    pub async fn ready(&self) -> impl IntoResponse {
        let schema = self.engine.schema();
        let root_ready = schema
            .object_type(schema.query_type())
            .is_some_and(|root| !root.fields.is_empty());

        if root_ready {
            (StatusCode::OK, Json(serde_json::json!({
                "status": "ready",
                "message": "Server is ready to accept requests"
            })))
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, Json(serde_json::json!({
                "status": "not_ready",
                "message": "Schema has no query fields"
            })))
        }
    }

    pub async fn live(&self) -> impl IntoResponse {
        (StatusCode::OK, Json(serde_json::json!({
            "status": "alive",
            "message": "Server is alive"
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock_registry::MockRegistry;
    use crate::domain::SchemaModel;

    fn handler(sdl: &str) -> HealthHandler {
        let schema = SchemaModel::load(sdl).unwrap();
        let registry = MockRegistry::for_schema(&schema);
        HealthHandler::new(Arc::new(MockEngine::new(schema, registry)))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = handler("type Query { a: Int }").health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_endpoint_with_schema() {
        let response = handler("type Query { a: Int }").ready().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_live_endpoint() {
        let response = handler("type Query { a: Int }").live().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
