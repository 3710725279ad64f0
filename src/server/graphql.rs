// GraphQL server for the HTTP adapter
// Serves the bundled schema through the adapter, plus GraphiQL and websocket subscriptions

use std::net::SocketAddr;

use async_graphql::http::GraphiQLSource;
use async_graphql::Request as GraphQLRequest;
use async_graphql_axum::GraphQLSubscription;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Router, Server,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use super::handler::GraphQLHandler;
use crate::config::ServerConfig;
use crate::engine::{create_schema, GatewaySchema, GraphQLOptions, OptionsResolver, SchemaExecutor};
use crate::models::RawRequest;
use crate::{AdapterError, Result};

/// GraphQL server
pub struct GraphQLServer {
    config: ServerConfig,
    schema: GatewaySchema,
}

impl GraphQLServer {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            schema: create_schema(),
        }
    }

    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_schema(mut self, schema: GatewaySchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the full application router
    pub fn router(&self) -> Router {
        // Operations can read the HTTP request through `RawRequest` context data
        let options = GraphQLOptions::new(self.schema.clone())
            .with_context(|raw: &RawRequest, request: GraphQLRequest| request.data(raw.clone()));
        let handler = GraphQLHandler::new(OptionsResolver::fixed(options), SchemaExecutor::new());

        let mut app = handler
            .into_router(&self.config.path)
            .route_service("/ws", GraphQLSubscription::new(self.schema.clone()))
            .route("/health", get(health_check));

        if self.config.graphiql_enabled {
            let page = GraphiQLSource::build()
                .endpoint(&self.config.path)
                .subscription_endpoint("/ws")
                .finish();
            app = app.route(
                "/graphiql",
                get(move || {
                    let page = page.clone();
                    async move { Html(page) }
                }),
            );
        }

        if self.config.cors_enabled {
            app = app.layer(CorsLayer::permissive());
        }

        app.layer(TraceLayer::new_for_http())
    }

    pub async fn run(self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| AdapterError::Internal(format!("invalid listen address: {}", e)))?;
        let app = self.router();

        info!("🚀 GraphQL server running on http://{}", addr);
        info!("🔗 GraphQL endpoint: http://{}{}", addr, self.config.path);
        if self.config.graphiql_enabled {
            info!("📊 GraphiQL interface: http://{}/graphiql", addr);
        }
        info!("📡 GraphQL WebSocket: ws://{}/ws", addr);

        // Use axum 0.6 syntax
        Server::bind(&addr)
            .serve(app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AdapterError::Internal(format!("server error: {}", e)))?;

        info!("Server stopped");
        Ok(())
    }
}

impl Default for GraphQLServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder kept in step with the CLI flags of the server binary
pub struct GraphQLServerBuilder {
    server: GraphQLServer,
}

impl GraphQLServerBuilder {
    pub fn new() -> Self {
        Self {
            server: GraphQLServer::new(),
        }
    }

    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.server = self.server.with_config(config);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.server.config.port = port;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.server.config.host = host.into();
        self
    }

    pub fn with_schema(mut self, schema: GatewaySchema) -> Self {
        self.server = self.server.with_schema(schema);
        self
    }

    pub fn build(self) -> GraphQLServer {
        self.server
    }

    pub async fn build_and_run(self) -> Result<()> {
        self.server.run().await
    }
}

impl Default for GraphQLServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "GraphQL HTTP adapter is running!")
}
