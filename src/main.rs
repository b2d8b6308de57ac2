use clap::Parser;
use graphql_mock::adapters::health_handler::HealthHandler;
use graphql_mock::adapters::metrics_handler::{MetricsCollector, MetricsHandler};
use graphql_mock::adapters::mock_registry::MockRegistry;
use graphql_mock::adapters::mock_resolver::MockEngine;
use graphql_mock::cli::Cli;
use graphql_mock::config::Settings;
use graphql_mock::domain::SchemaModel;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // CLI > env vars > config file
    let settings = Settings::new_with_cli(&cli)?;

    let sdl = settings.read_schema()?;
    let schema = SchemaModel::load(&sdl)
        .map_err(|e| anyhow::anyhow!("Failed to load schema {}: {}", settings.schema.path, e))?;
    info!(
        "Loaded schema {} with {} types",
        settings.schema.path,
        schema.types().count()
    );

    let mut registry = MockRegistry::for_schema(&schema).with_list_length(settings.mocks.list_length);
    registry.register_configs(&settings.rules);
    for type_name in settings.rules.keys() {
        if !schema.contains_type(type_name) {
            warn!("Mock rule for unknown type {} is never used", type_name);
        }
    }
    info!("Registered {} mock rules", registry.len());

    let engine = Arc::new(MockEngine::new(schema, registry).with_seed(settings.mocks.seed));
    if let Some(seed) = settings.mocks.seed {
        info!("Using fixed seed {}", seed);
    }

    let health_handler = Arc::new(HealthHandler::new(engine.clone()));
    let metrics_handler = Arc::new(MetricsHandler::new(Arc::new(MetricsCollector::new()?)));

    let app = graphql_mock::create_app(engine, health_handler, metrics_handler);

    let listener =
        tokio::net::TcpListener::bind((settings.server.host.as_str(), settings.server.port)).await?;
    let local_addr = listener.local_addr()?;
    info!("Server ready at http://{}/", local_addr);
    println!("Server ready at http://{}/", local_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
