// async-graphql execution engine
// Implements the engine boundary for an `async_graphql::Schema`

//! # Schema Executor
//!
//! [`SchemaExecutor`] plugs an `async_graphql::Schema` into the adapter. The
//! schema itself travels inside the per-request [`GraphQLOptions`], so a
//! dynamic options resolver can serve different schemas to different callers.
//!
//! ## Payload interpretation
//!
//! The normalized payload is a JSON object with the usual GraphQL-over-HTTP
//! keys:
//!
//! - `query` (required, non-empty string)
//! - `operationName` (optional string)
//! - `variables` / `extensions` (JSON objects, or JSON-encoded strings as they
//!   arrive in a GET query string)
//!
//! Client mistakes become [`HttpQueryError`]s so the adapter renders them with
//! the right status. A GET request may not run a mutation.
//!
//! ## Response shape
//!
//! If the client accepts `multipart/mixed`, the operation runs through
//! `Schema::execute_stream` and every produced response becomes one patch.
//! Otherwise the schema runs once and the serialized response is returned as a
//! single JSON body.

use std::{marker::PhantomData, sync::Arc};

use async_graphql::{
    parser::{
        parse_query,
        types::{DocumentOperations, OperationType},
    },
    ObjectType, Request, Schema, SubscriptionType,
};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use futures::StreamExt;
use serde_json::{Map, Value};
use tracing::debug;

use super::executor::{ExecutionInput, QueryExecutor};
use crate::models::{
    BoxError, ExecutionError, ExecutionOutcome, HttpQueryError, RawRequest, RequestMethod,
    ResponseInit,
};

/// Hook that decorates the engine request with per-request context data
pub type ContextFn = dyn Fn(&RawRequest, Request) -> Request + Send + Sync;

/// Options understood by [`SchemaExecutor`]
pub struct GraphQLOptions<Q, M, S> {
    pub schema: Schema<Q, M, S>,
    context: Option<Arc<ContextFn>>,
}

impl<Q, M, S> GraphQLOptions<Q, M, S> {
    pub fn new(schema: Schema<Q, M, S>) -> Self {
        Self {
            schema,
            context: None,
        }
    }

    /// Run `context` on every engine request before execution
    ///
    /// Typical use is attaching request-scoped data with `Request::data`.
    pub fn with_context<F>(mut self, context: F) -> Self
    where
        F: Fn(&RawRequest, Request) -> Request + Send + Sync + 'static,
    {
        self.context = Some(Arc::new(context));
        self
    }

    fn prepare(&self, raw: &RawRequest, request: Request) -> Request {
        match &self.context {
            Some(context) => context(raw, request),
            None => request,
        }
    }
}

impl<Q, M, S> Clone for GraphQLOptions<Q, M, S> {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            context: self.context.clone(),
        }
    }
}

/// Execution engine backed by an `async_graphql::Schema`
pub struct SchemaExecutor<Q, M, S> {
    _schema: PhantomData<fn() -> (Q, M, S)>,
}

impl<Q, M, S> SchemaExecutor<Q, M, S> {
    pub fn new() -> Self {
        Self {
            _schema: PhantomData,
        }
    }
}

impl<Q, M, S> Default for SchemaExecutor<Q, M, S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<Q, M, S> QueryExecutor for SchemaExecutor<Q, M, S>
where
    Q: ObjectType + 'static,
    M: ObjectType + 'static,
    S: SubscriptionType + 'static,
{
    type Options = GraphQLOptions<Q, M, S>;

    async fn execute(
        &self,
        input: ExecutionInput<Self::Options>,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let ExecutionInput {
            method,
            options,
            query,
            request,
        } = input;

        if method == RequestMethod::Other {
            return Err(HttpQueryError::method_not_allowed(
                "GraphQL only supports GET and POST requests.",
                "GET, POST",
            )
            .into());
        }

        let operation = build_request(query)?;

        if method == RequestMethod::Get
            && operation_type(&operation.query, operation.operation_name.as_deref())
                == Some(OperationType::Mutation)
        {
            return Err(HttpQueryError::method_not_allowed(
                "GET supports only query operation",
                "POST",
            )
            .into());
        }

        let operation = options.prepare(&request, operation);

        if request.accepts_multipart() {
            debug!("Executing operation as an incremental stream");
            let patches = options
                .schema
                .execute_stream(operation)
                .map(|response| serde_json::to_string(&response).map_err(BoxError::from));
            return Ok(ExecutionOutcome::streamed(patches.boxed()));
        }

        let response = options.schema.execute(operation).await;

        // Nothing was executed at all, e.g. the document failed validation
        let status = if response.data == async_graphql::Value::Null && response.is_err() {
            Some(StatusCode::BAD_REQUEST)
        } else {
            None
        };

        let body = serde_json::to_string(&response).map_err(ExecutionError::other)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        Ok(ExecutionOutcome::single(
            body,
            ResponseInit {
                status,
                headers,
            },
        ))
    }
}

/// Turn the normalized payload into an engine request
fn build_request(payload: Value) -> Result<Request, HttpQueryError> {
    let mut fields = match payload {
        Value::Object(fields) => fields,
        Value::Null => Map::new(),
        Value::Array(_) => {
            return Err(HttpQueryError::bad_request(
                "Batched operations are not supported.",
            ))
        }
        _ => {
            return Err(HttpQueryError::bad_request(
                "GraphQL payload must be a JSON object.",
            ))
        }
    };

    let query = match fields.remove("query") {
        Some(Value::String(query)) if !query.trim().is_empty() => query,
        _ => return Err(HttpQueryError::bad_request("Must provide query string.")),
    };

    let mut request = Map::new();
    request.insert("query".to_string(), Value::String(query));

    match fields.remove("operationName") {
        None | Some(Value::Null) => {}
        Some(Value::String(name)) if name.is_empty() => {}
        Some(Value::String(name)) => {
            request.insert("operationName".to_string(), Value::String(name));
        }
        Some(_) => {
            return Err(HttpQueryError::bad_request(
                "Operation name must be a string.",
            ))
        }
    }
    if let Some(variables) = decode_object(fields.remove("variables"), "Variables are invalid JSON.")? {
        request.insert("variables".to_string(), variables);
    }
    if let Some(extensions) =
        decode_object(fields.remove("extensions"), "Extensions are invalid JSON.")?
    {
        request.insert("extensions".to_string(), extensions);
    }

    serde_json::from_value(Value::Object(request))
        .map_err(|error| HttpQueryError::bad_request(error.to_string()))
}

/// Accept a JSON object either inline or encoded as a string
fn decode_object(value: Option<Value>, message: &str) -> Result<Option<Value>, HttpQueryError> {
    let value = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(encoded)) if encoded.trim().is_empty() => return Ok(None),
        Some(Value::String(encoded)) => serde_json::from_str(&encoded)
            .map_err(|_| HttpQueryError::bad_request(message))?,
        Some(value) => value,
    };

    match value {
        Value::Object(_) => Ok(Some(value)),
        Value::Null => Ok(None),
        _ => Err(HttpQueryError::bad_request(message)),
    }
}

/// Operation type selected by `operation_name`, if the document parses
fn operation_type(query: &str, operation_name: Option<&str>) -> Option<OperationType> {
    let document = parse_query(query).ok()?;

    match (&document.operations, operation_name) {
        (DocumentOperations::Single(operation), _) => Some(operation.node.ty),
        (DocumentOperations::Multiple(operations), Some(name)) => {
            operations.get(name).map(|operation| operation.node.ty)
        }
        (DocumentOperations::Multiple(operations), None) if operations.len() == 1 => {
            operations.values().next().map(|operation| operation.node.ty)
        }
        _ => None,
    }
}
