// HTTP side of the adapter
// Request handling, response dispatch, error classification, and the bundled server

//! # Server Module
//!
//! The server layer sits between the host framework (axum) and the engine
//! layer:
//!
//! ```text
//! Client
//!        ↓ HTTP
//! Server Layer (this module) ← normalize, dispatch, classify
//!        ↓ QueryExecutor::execute
//! Engine Layer ← options resolution, GraphQL execution
//! ```
//!
//! ## Response modes
//!
//! - **Single**: one body with an exact `Content-Length`
//! - **Streamed**: `multipart/mixed` with the boundary `-`, one part per patch
//! - **Error**: protocol errors rendered with their own status and headers;
//!   everything else is returned to the host as the service error

/// The adapter as a `tower::Service`, and its builder
pub mod handler;

/// Outcome → HTTP response
pub mod dispatch;

/// Failure → rendered response or forwarded error
pub mod classify;

/// Axum server around the bundled schema
pub mod graphql;

#[cfg(test)]
mod handler_tests;

pub use classify::{classify, Disposition};
pub use dispatch::{dispatch, ResponseMode, MULTIPART_BOUNDARY, MULTIPART_CONTENT_TYPE};
pub use graphql::{GraphQLServer, GraphQLServerBuilder};
pub use handler::{GraphQLHandler, GraphQLHandlerBuilder};
