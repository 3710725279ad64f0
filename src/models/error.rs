// Execution failure types
// What the execution engine can report instead of an outcome

use axum::http::{header::HeaderName, HeaderMap, HeaderValue, StatusCode};
use thiserror::Error;

/// Boxed error forwarded to the host framework's failure channel
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A failure that is rendered directly as an HTTP response
///
/// Engines raise this for problems the client caused (malformed payloads,
/// wrong method for an operation). It carries everything needed to write the
/// response: status, extra headers, and a plain-text message body.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct HttpQueryError {
    pub status_code: StatusCode,
    pub headers: HeaderMap,
    pub message: String,
}

impl HttpQueryError {
    pub fn new(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code,
            headers: HeaderMap::new(),
            message: message.into(),
        }
    }

    /// Attach a header to the rendered response
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn method_not_allowed(message: impl Into<String>, allow: &'static str) -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, message)
            .with_header(axum::http::header::ALLOW, HeaderValue::from_static(allow))
    }
}

/// Why an execution produced no outcome
///
/// The split is closed: a `Protocol` error is rendered by the adapter, anything
/// else travels back to the host untouched.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error(transparent)]
    Protocol(#[from] HttpQueryError),

    #[error(transparent)]
    Other(BoxError),
}

impl ExecutionError {
    pub fn other(error: impl Into<BoxError>) -> Self {
        ExecutionError::Other(error.into())
    }
}
