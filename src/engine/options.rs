// Options resolution
// Produces the execution configuration for one request

//! # Options Resolver
//!
//! Execution options come from exactly one source, fixed when the handler is
//! built:
//!
//! - [`OptionsResolver::Static`]: one value shared read-only by every request
//! - [`OptionsResolver::Dynamic`]: a function called with the current request
//!   and the pending response headers, returning a future of the options
//!
//! The variant is chosen once at construction, so per-request resolution is a
//! single `match`.
//!
//! A failing dynamic resolver fails only the request that invoked it. The
//! error is returned as-is for the host framework to handle.
//!
//! ## Rust Learning Notes:
//!
//! ### Boxed futures behind `Arc<dyn Fn>`
//! The resolver closure is stored as `Arc<dyn Fn(..) -> BoxFuture<..>>` so the
//! handler stays cheaply cloneable and the closure can be shared by every
//! concurrent request. The returned future is `'static`: a resolver clones
//! whatever it needs from the borrowed request before going async.

use std::{future::Future, sync::Arc};

use axum::http::HeaderMap;
use futures::future::{self, BoxFuture};

use crate::models::{BoxError, RawRequest};

/// Future produced by a dynamic resolver
pub type OptionsFuture<O> = BoxFuture<'static, Result<O, BoxError>>;

/// Resolver signature: request in, pending response headers writable
pub type OptionsFn<O> = dyn Fn(&RawRequest, &mut HeaderMap) -> OptionsFuture<O> + Send + Sync;

/// Source of execution options for a handler
pub enum OptionsResolver<O> {
    Static(Arc<O>),
    Dynamic(Arc<OptionsFn<O>>),
}

impl<O> Clone for OptionsResolver<O> {
    fn clone(&self) -> Self {
        match self {
            OptionsResolver::Static(options) => OptionsResolver::Static(Arc::clone(options)),
            OptionsResolver::Dynamic(resolve) => OptionsResolver::Dynamic(Arc::clone(resolve)),
        }
    }
}

impl<O> std::fmt::Debug for OptionsResolver<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionsResolver::Static(_) => write!(f, "OptionsResolver::Static"),
            OptionsResolver::Dynamic(_) => write!(f, "OptionsResolver::Dynamic"),
        }
    }
}

impl<O> OptionsResolver<O>
where
    O: Send + Sync + 'static,
{
    /// Same options for every request
    pub fn fixed(options: O) -> Self {
        OptionsResolver::Static(Arc::new(options))
    }

    /// Options computed per request by an async function
    pub fn from_fn<F, Fut>(resolve: F) -> Self
    where
        F: Fn(&RawRequest, &mut HeaderMap) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, BoxError>> + Send + 'static,
    {
        let resolve: Arc<OptionsFn<O>> = Arc::new(
            move |request: &RawRequest, headers: &mut HeaderMap| -> OptionsFuture<O> {
                Box::pin(resolve(request, headers))
            },
        );
        OptionsResolver::Dynamic(resolve)
    }

    /// Options computed per request by a synchronous function
    pub fn from_sync_fn<F>(resolve: F) -> Self
    where
        F: Fn(&RawRequest, &mut HeaderMap) -> Result<O, BoxError> + Send + Sync + 'static,
    {
        Self::from_fn(move |request, headers| future::ready(resolve(request, headers)))
    }

    /// Resolve the options for one request
    ///
    /// Headers a dynamic resolver inserts into `response_headers` end up on
    /// whatever response the adapter renders for this request.
    pub async fn resolve(
        &self,
        request: &RawRequest,
        response_headers: &mut HeaderMap,
    ) -> Result<Arc<O>, BoxError> {
        match self {
            OptionsResolver::Static(options) => Ok(Arc::clone(options)),
            OptionsResolver::Dynamic(resolve) => resolve(request, response_headers).await.map(Arc::new),
        }
    }
}
