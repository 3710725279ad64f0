// Execution engine layer
// Options resolution and the boundary into the GraphQL execution engine

//! # Engine Module
//!
//! Everything between a normalized request and an execution outcome:
//!
//! ```text
//! RequestDescriptor
//!        ↓ OptionsResolver::resolve
//! ExecutionInput { method, options, query, request }
//!        ↓ QueryExecutor::execute
//! Result<ExecutionOutcome, ExecutionError>
//! ```
//!
//! The adapter never looks inside an engine. [`QueryExecutor`] is the whole
//! contract; [`SchemaExecutor`] is the bundled implementation for
//! `async_graphql` schemas.

/// Per-request options: static value or resolver function
pub mod options;

/// The engine trait and its input type
pub mod executor;

/// `async_graphql::Schema` as an execution engine
pub mod schema_executor;

/// Schema served by the bundled server binary
pub mod graphql;

pub use executor::{ExecutionInput, QueryExecutor};
pub use graphql::{create_schema, create_schema_with_greeting, GatewaySchema, Greeting};
pub use options::{OptionsFn, OptionsFuture, OptionsResolver};
pub use schema_executor::{ContextFn, GraphQLOptions, SchemaExecutor};
