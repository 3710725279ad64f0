// Execution engine boundary
// The single call the adapter makes into a GraphQL execution engine

use std::sync::Arc;

use serde_json::Value;

use crate::models::{ExecutionError, ExecutionOutcome, RawRequest, RequestDescriptor, RequestMethod};

/// Everything an engine receives for one request
#[derive(Debug)]
pub struct ExecutionInput<O> {
    pub method: RequestMethod,
    pub options: Arc<O>,
    /// Query payload selected by the normalizer
    pub query: Value,
    pub request: RawRequest,
}

impl<O> ExecutionInput<O> {
    pub fn new(descriptor: RequestDescriptor, options: Arc<O>) -> Self {
        Self {
            method: descriptor.method,
            options,
            query: descriptor.payload,
            request: descriptor.request,
        }
    }
}

/// A GraphQL execution engine
///
/// Implementations turn one [`ExecutionInput`] into either an outcome or an
/// [`ExecutionError`]. Returning `ExecutionError::Protocol` asks the adapter to
/// render the failure; `ExecutionError::Other` is handed back to the host.
///
/// ## Rust Learning Notes:
///
/// ### Associated types
/// `Options` ties an engine to the configuration it understands, so a handler
/// built for one engine cannot be fed another engine's options.
#[async_trait::async_trait]
pub trait QueryExecutor: Send + Sync {
    type Options: Send + Sync + 'static;

    async fn execute(
        &self,
        input: ExecutionInput<Self::Options>,
    ) -> Result<ExecutionOutcome, ExecutionError>;
}
