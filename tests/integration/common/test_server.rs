use graphql_mock::adapters::{
    health_handler::HealthHandler,
    metrics_handler::{MetricsCollector, MetricsHandler},
    mock_registry::MockRegistry,
    mock_resolver::MockEngine,
};
use graphql_mock::domain::SchemaModel;
use std::net::SocketAddr;
use std::sync::Arc;

pub const SCHEMA: &str = r#"
    scalar Money

    enum Role { ADMIN MEMBER }

    interface Node { id: ID! }

    type User implements Node {
        id: ID!
        name: String!
        age: Int
        role: Role!
        balance: Money
        profile: UserProfileType
        friends: [User!]!
    }

    type Post implements Node {
        id: ID!
        title: String
    }

    type UserProfileType {
        fullName: String
        avatar: ImageType
    }

    type ImageType {
        filePath: String
    }

    union SearchResult = User | Post

    type Query {
        me: User
        node: Node
        search: [SearchResult!]!
        tags: [String!]!
    }

    type Mutation {
        rename(name: String!): User
    }
"#;

pub struct TestServer {
    pub addr: SocketAddr,
    pub base_url: String,
}

impl TestServer {
    pub async fn new() -> Self {
        Self::with_registry(|_| {}).await
    }

    pub async fn with_registry(configure: impl FnOnce(&mut MockRegistry)) -> Self {
        Self::with_schema(SCHEMA, configure).await
    }

    pub async fn with_schema(sdl: &str, configure: impl FnOnce(&mut MockRegistry)) -> Self {
        let schema = SchemaModel::load(sdl).unwrap();
        let mut registry = MockRegistry::for_schema(&schema);
        configure(&mut registry);
        let engine = Arc::new(MockEngine::new(schema, registry).with_seed(Some(7)));

        let health_handler = Arc::new(HealthHandler::new(engine.clone()));
        let metrics_collector = Arc::new(MetricsCollector::new().unwrap());
        let metrics_handler = Arc::new(MetricsHandler::new(metrics_collector));

        let app = graphql_mock::create_app(engine, health_handler, metrics_handler);

        // Start server on random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        TestServer { addr, base_url }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
