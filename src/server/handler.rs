// GraphQL HTTP handler
// Wires normalization, options, execution, dispatch, and classification together

//! # GraphQL Handler
//!
//! [`GraphQLHandler`] is the adapter as a `tower::Service`. One call handles one
//! request:
//!
//! ```text
//! Request<Body>
//!   ↓ split, read JSON body (POST only)
//! RequestDescriptor          (normalizer)
//!   ↓ OptionsResolver::resolve
//! ExecutionInput
//!   ↓ QueryExecutor::execute
//! Ok(outcome)  → dispatch  → Response (single body or multipart stream)
//! Err(error)   → classify  → Response (protocol error) or Err (forwarded)
//! ```
//!
//! Forwarded errors are the service's `Error` type. Mount the handler behind
//! `HandleErrorLayer` (see [`GraphQLHandler::into_router`]) so the host turns
//! them into its default failure response.
//!
//! ## Construction
//!
//! [`GraphQLHandler::new`] takes exactly one options source by signature.
//! [`GraphQLHandlerBuilder`] collects sources from configuration code and
//! rejects zero or several of them at `build()`, before any request is served.
//!
//! ## Rust Learning Notes:
//!
//! ### Services vs handlers
//! axum handlers must be infallible, but the adapter needs a real failure
//! channel for errors it does not own. Implementing `Service` directly gives
//! it one (`type Error = BoxError`), and `HandleError` bridges it back to an
//! infallible route.

use std::{
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    body::Body,
    error_handling::HandleErrorLayer,
    http::{HeaderMap, Request, Response, StatusCode},
    response::IntoResponse,
    Router,
};
use futures::future::BoxFuture;
use serde_json::Value;
use tower::{Service, ServiceBuilder};
use tracing::{debug, debug_span, warn, Instrument};
use uuid::Uuid;

use super::{
    classify::{classify, Disposition},
    dispatch::dispatch,
};
use crate::engine::{ExecutionInput, OptionsResolver, QueryExecutor};
use crate::models::{
    BoxError, ExecutionError, HttpQueryError, RawRequest, RequestDescriptor, RequestMethod,
};
use crate::{ConfigurationError, Result};

/// The adapter between HTTP and a GraphQL execution engine
pub struct GraphQLHandler<E: QueryExecutor> {
    options: OptionsResolver<E::Options>,
    executor: Arc<E>,
}

impl<E: QueryExecutor> Clone for GraphQLHandler<E> {
    fn clone(&self) -> Self {
        Self {
            options: self.options.clone(),
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<E> GraphQLHandler<E>
where
    E: QueryExecutor + 'static,
{
    pub fn new(options: OptionsResolver<E::Options>, executor: E) -> Self {
        Self {
            options,
            executor: Arc::new(executor),
        }
    }

    pub fn builder() -> GraphQLHandlerBuilder<E> {
        GraphQLHandlerBuilder::new()
    }

    /// Handle one request
    ///
    /// Returns `Err` only for failures the adapter does not render itself;
    /// the error is the one the options resolver or engine produced.
    pub async fn handle(&self, request: Request<Body>) -> std::result::Result<Response<Body>, BoxError> {
        let request_id = Uuid::new_v4();
        let span = debug_span!(
            "graphql_request",
            %request_id,
            method = %request.method(),
            path = %request.uri().path(),
        );

        self.handle_request(request).instrument(span).await
    }

    async fn handle_request(
        &self,
        request: Request<Body>,
    ) -> std::result::Result<Response<Body>, BoxError> {
        let (parts, body) = request.into_parts();
        let raw = RawRequest::from(parts);

        let body = match RequestMethod::from(&raw.method) {
            RequestMethod::Post => match read_json_body(body).await {
                Ok(body) => Some(body),
                Err(error) => return finish_with_error(error, HeaderMap::new()),
            },
            RequestMethod::Get | RequestMethod::Other => None,
        };

        let descriptor = RequestDescriptor::normalize(raw, body);
        debug!(method = %descriptor.method, "Normalized request");

        let mut response_headers = HeaderMap::new();
        let options = match self
            .options
            .resolve(&descriptor.request, &mut response_headers)
            .await
        {
            Ok(options) => options,
            Err(error) => {
                warn!("Options resolution failed: {}", error);
                return Err(error);
            }
        };

        match self.executor.execute(ExecutionInput::new(descriptor, options)).await {
            Ok(outcome) => Ok(dispatch(outcome, response_headers)),
            Err(error) => finish_with_error(error, response_headers),
        }
    }

    /// Mount the handler at `path` on a fresh router
    ///
    /// Forwarded errors become a plain `500 Internal Server Error`.
    pub fn into_router(self, path: &str) -> Router {
        let service = ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_forwarded_error))
            .service(self);

        Router::new().route_service(path, service)
    }
}

fn finish_with_error(
    error: ExecutionError,
    pending_headers: HeaderMap,
) -> std::result::Result<Response<Body>, BoxError> {
    match classify(error, pending_headers) {
        Disposition::Render(response) => {
            debug!(status = %response.status(), "Rendered protocol error");
            Ok(response)
        }
        Disposition::Forward(error) => {
            warn!("Forwarding unclassified error: {}", error);
            Err(error)
        }
    }
}

/// Host-side body parsing for POST requests
async fn read_json_body(body: Body) -> std::result::Result<Value, ExecutionError> {
    let bytes = hyper::body::to_bytes(body)
        .await
        .map_err(ExecutionError::other)?;

    if bytes.is_empty() {
        return Err(HttpQueryError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "POST body missing. Did you forget to send a JSON body?",
        )
        .into());
    }

    serde_json::from_slice(&bytes)
        .map_err(|_| HttpQueryError::bad_request("POST body sent invalid JSON.").into())
}

async fn handle_forwarded_error(error: BoxError) -> impl IntoResponse {
    debug!("Host failure handler received: {}", error);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

impl<E> Service<Request<Body>> for GraphQLHandler<E>
where
    E: QueryExecutor + 'static,
{
    type Response = Response<Body>;
    type Error = BoxError;
    type Future = BoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move { handler.handle(request).await })
    }
}

/// Collects handler configuration and validates it once
pub struct GraphQLHandlerBuilder<E: QueryExecutor> {
    options: Vec<OptionsResolver<E::Options>>,
    executor: Option<E>,
}

impl<E> GraphQLHandlerBuilder<E>
where
    E: QueryExecutor + 'static,
{
    pub fn new() -> Self {
        Self {
            options: Vec::new(),
            executor: None,
        }
    }

    /// Add a static options value
    pub fn options(mut self, options: E::Options) -> Self {
        self.options.push(OptionsResolver::fixed(options));
        self
    }

    /// Add an options source of either kind
    pub fn options_resolver(mut self, resolver: OptionsResolver<E::Options>) -> Self {
        self.options.push(resolver);
        self
    }

    pub fn executor(mut self, executor: E) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Build the handler; requires exactly one options source and an executor
    pub fn build(mut self) -> Result<GraphQLHandler<E>> {
        let options = match self.options.len() {
            0 => return Err(ConfigurationError::MissingOptions.into()),
            1 => self.options.remove(0),
            count => return Err(ConfigurationError::TooManyOptions { count }.into()),
        };
        let executor = self.executor.ok_or(ConfigurationError::MissingExecutor)?;

        Ok(GraphQLHandler::new(options, executor))
    }
}

impl<E> Default for GraphQLHandlerBuilder<E>
where
    E: QueryExecutor + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
