// GraphQL HTTP Adapter - Server binary
// Run with: cargo run --bin server -- --port 4000

//! # Server Binary
//!
//! Starts an axum server that serves the bundled schema through the adapter.
//!
//! Configuration is layered, later sources winning:
//! 1. built-in defaults
//! 2. `gql-adapter.toml` (or the file given with `--config`)
//! 3. `GQL_ADAPTER_*` environment variables, including ones from `.env`
//! 4. command-line flags
//!
//! Once running:
//! - `POST /graphql` with `{"query": "{ hello }"}` returns a single JSON body
//! - the same request with `Accept: multipart/mixed` streams patches
//! - `GET /graphiql` opens GraphiQL

use std::path::PathBuf;

use clap::Parser;
use dotenv::dotenv;
use gql_http_adapter::{GraphQLServerBuilder, ServerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "server", version, about = "GraphQL HTTP adapter server")]
struct Args {
    /// Configuration file (TOML, YAML, or JSON)
    #[arg(short, long, env = "GQL_ADAPTER_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file; it's optional
    if let Err(e) = dotenv() {
        eprintln!("Warning: Could not load .env file: {}", e);
    }

    let args = Args::parse();
    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🚀 Starting GraphQL HTTP adapter...");
    info!("Server: {}:{}", config.host, config.port);
    info!("CORS enabled: {}", config.cors_enabled);

    GraphQLServerBuilder::new()
        .with_config(config)
        .build_and_run()
        .await?;

    Ok(())
}
