pub mod graphql_handler;
pub mod health_handler;
pub mod metrics_handler;
pub mod mock_registry;
pub mod mock_resolver;
