// Response dispatch
// Serializes an execution outcome onto an HTTP response

//! # Response Dispatcher
//!
//! An outcome leaves the adapter in exactly one of two shapes:
//!
//! - **Single**: headers from the engine's [`ResponseInit`], a
//!   `Content-Length` equal to the UTF-8 byte length of the body, then the
//!   body itself.
//! - **Streamed**: `Content-Type: multipart/mixed; boundary="-"`, every patch
//!   followed by `"\r\n---\r\n"`, and a closing `"\r\n---"` once the patch
//!   stream completes.
//!
//! The streamed body is fed through a `hyper` body channel by a spawned task,
//! so patches are written as soon as the engine produces them and strictly in
//! the order it produces them.
//!
//! ## Mid-stream failures
//!
//! - A dropped body means the client is gone. The task notices it while
//!   waiting for the next patch or on a failed write, logs it, drops the patch
//!   stream (which cancels the producer) and ends.
//! - A patch stream yielding an error aborts the body. The client sees an
//!   incomplete transfer instead of a closing boundary, which keeps a partial
//!   result from passing as a complete one.

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Response, StatusCode},
};
use std::task::Poll;

use bytes::Bytes;
use futures::{future, StreamExt};
use tracing::{debug, error, warn, Instrument};

use crate::models::{ExecutionOutcome, PatchStream, ResponseInit};

/// Literal multipart boundary token
pub const MULTIPART_BOUNDARY: &str = "-";

/// `Content-Type` of a streamed response
pub const MULTIPART_CONTENT_TYPE: &str = "multipart/mixed; boundary=\"-\"";

/// Written after every patch
pub const PART_DELIMITER: &str = "\r\n---\r\n";

/// Written once after the last patch
pub const CLOSE_DELIMITER: &str = "\r\n---";

/// Which shape a dispatched response took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Single,
    Stream,
}

/// Build the response for `outcome`
///
/// `pending_headers` are headers collected before execution (e.g. by a dynamic
/// options resolver); they go onto the response in either mode.
pub fn dispatch(outcome: ExecutionOutcome, pending_headers: HeaderMap) -> Response<Body> {
    match outcome {
        ExecutionOutcome::Single { body, init } => {
            debug!(mode = ?ResponseMode::Single, bytes = body.len(), "Dispatching response");
            single_response(body, init, pending_headers)
        }
        ExecutionOutcome::Streamed { patches } => {
            debug!(mode = ?ResponseMode::Stream, "Dispatching response");
            streamed_response(patches, pending_headers)
        }
    }
}

fn single_response(body: String, init: ResponseInit, pending_headers: HeaderMap) -> Response<Body> {
    let ResponseInit { status, headers } = init;
    let content_length = HeaderValue::from(body.len());

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status.unwrap_or(StatusCode::OK);

    let response_headers = response.headers_mut();
    response_headers.extend(pending_headers);
    response_headers.extend(headers);
    // String::len is the UTF-8 byte length
    response_headers.insert(header::CONTENT_LENGTH, content_length);

    response
}

fn streamed_response(patches: PatchStream, pending_headers: HeaderMap) -> Response<Body> {
    let (sender, body) = Body::channel();

    tokio::spawn(write_patches(patches, sender).in_current_span());

    let mut response = Response::new(body);
    let response_headers = response.headers_mut();
    response_headers.extend(pending_headers);
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(MULTIPART_CONTENT_TYPE),
    );

    response
}

/// Frame one patch as a multipart part
pub fn frame_patch(patch: &str) -> Bytes {
    let mut part = String::with_capacity(patch.len() + PART_DELIMITER.len());
    part.push_str(patch);
    part.push_str(PART_DELIMITER);
    Bytes::from(part)
}

async fn write_patches(mut patches: PatchStream, mut sender: hyper::body::Sender) {
    let mut written = 0usize;

    loop {
        let next = tokio::select! {
            next = patches.next() => next,
            _ = client_gone(&mut sender) => {
                warn!("Client went away after {} patches, stopping stream", written);
                return;
            }
        };
        let patch = match next {
            Some(Ok(patch)) => patch,
            None => break,
            Some(Err(e)) => {
                error!("Patch stream failed after {} patches: {}", written, e);
                sender.abort();
                return;
            }
        };

        if sender.send_data(frame_patch(&patch)).await.is_err() {
            warn!("Client went away after {} patches, stopping stream", written);
            return;
        }
        written += 1;
    }

    if sender
        .send_data(Bytes::from_static(CLOSE_DELIMITER.as_bytes()))
        .await
        .is_err()
    {
        warn!("Client went away before the closing boundary");
        return;
    }

    debug!("Stream closed after {} patches", written);
}

/// Resolves once the response body has been dropped
///
/// `poll_ready` registers interest in the body's lifetime, so an idle writer
/// is woken as soon as the client disconnects.
async fn client_gone(sender: &mut hyper::body::Sender) {
    future::poll_fn(|cx| match sender.poll_ready(cx) {
        Poll::Ready(Err(_)) => Poll::Ready(()),
        Poll::Ready(Ok(())) | Poll::Pending => Poll::Pending,
    })
    .await
}
