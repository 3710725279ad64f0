// Error classification
// Decides whether an execution failure is rendered here or handed to the host

use axum::{
    body::Body,
    http::{HeaderMap, Response},
};

use crate::models::{BoxError, ExecutionError, HttpQueryError};

/// What to do with a failed execution
#[derive(Debug)]
pub enum Disposition {
    /// A complete response to send to the client
    Render(Response<Body>),
    /// An error for the host framework's failure path; nothing was written
    Forward(BoxError),
}

/// Classify `error`
///
/// Protocol errors become a response carrying `pending_headers`, the error's
/// own headers, its status code, and its message as the body. Everything else
/// is forwarded unchanged.
pub fn classify(error: ExecutionError, pending_headers: HeaderMap) -> Disposition {
    match error {
        ExecutionError::Protocol(error) => Disposition::Render(render(error, pending_headers)),
        ExecutionError::Other(error) => Disposition::Forward(error),
    }
}

fn render(error: HttpQueryError, pending_headers: HeaderMap) -> Response<Body> {
    let HttpQueryError {
        status_code,
        headers,
        message,
    } = error;

    let mut response = Response::new(Body::from(message));
    *response.status_mut() = status_code;

    let response_headers = response.headers_mut();
    response_headers.extend(pending_headers);
    response_headers.extend(headers);

    response
}
