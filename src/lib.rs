// GraphQL HTTP Adapter
// Maps HTTP requests onto a GraphQL execution engine and its results back onto HTTP

//! # GraphQL HTTP Adapter Library
//!
//! This crate sits between an HTTP request/response pair and a GraphQL
//! execution engine. It normalizes the request, resolves the execution
//! options, calls the engine, and writes the engine's outcome back as HTTP.
//!
//! ## Core Components
//!
//! ### Request side
//! - [`RequestDescriptor`]: method, query payload, and raw request. POST
//!   payloads come from the JSON body, everything else from the query string.
//! - [`OptionsResolver`]: a static options value or a per-request function.
//!
//! ### Engine boundary
//! - [`QueryExecutor`]: the one call into the engine.
//! - [`SchemaExecutor`]: the bundled engine for `async_graphql` schemas.
//!
//! ### Response side
//! - [`dispatch`]: single body with an exact `Content-Length`, or a
//!   `multipart/mixed; boundary="-"` stream of patches.
//! - [`classify`]: protocol errors are rendered; anything else is handed back
//!   to the host framework untouched.
//!
//! **Usage Example:**
//! ```rust,no_run
//! use gql_http_adapter::{
//!     create_schema, GraphQLHandler, GraphQLOptions, OptionsResolver, SchemaExecutor,
//! };
//!
//! let handler = GraphQLHandler::new(
//!     OptionsResolver::fixed(GraphQLOptions::new(create_schema())),
//!     SchemaExecutor::new(),
//! );
//! let app = handler.into_router("/graphql");
//! # let _ = app;
//! ```
//!
//! ## Rust Learning Notes:
//!
//! ### Re-exports
//! `pub use` statements create shortcuts so users don't need to know the internal
//! module structure. Instead of `use gql_http_adapter::server::handler::GraphQLHandler`,
//! users can write `use gql_http_adapter::GraphQLHandler`.

// Request, outcome, and failure types
pub mod models;

// Options resolution and the execution engine boundary
pub mod engine;

// HTTP handling and the bundled server
pub mod server;

// Server configuration loading
pub mod config;

pub use models::{
    BoxError, ExecutionError, ExecutionOutcome, HttpQueryError, PatchStream, RawRequest,
    RequestDescriptor, RequestMethod, ResponseInit,
};

pub use engine::{
    create_schema, ExecutionInput, GatewaySchema, GraphQLOptions, OptionsResolver, QueryExecutor,
    SchemaExecutor,
};

pub use server::{
    classify, dispatch, Disposition, GraphQLHandler, GraphQLHandlerBuilder, GraphQLServer,
    GraphQLServerBuilder,
};

pub use crate::config::ServerConfig;

use thiserror::Error;

/// Setup-time mistakes, raised before any request is served
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("GraphQL handler requires options")]
    MissingOptions,

    #[error("GraphQL handler expects exactly one options source, got {count}")]
    TooManyOptions { count: usize },

    #[error("GraphQL handler requires an executor")]
    MissingExecutor,
}

/// Errors raised by the adapter itself
///
/// Per-request engine failures are not in here: they are [`ExecutionError`]s,
/// rendered or forwarded by the handler.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Problems reading configuration sources
    #[error("Config error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Type alias for Results that use the adapter's error type
pub type Result<T> = std::result::Result<T, AdapterError>;
