// Execution outcome types
// The two success shapes an execution engine can hand back

use axum::http::{HeaderMap, StatusCode};
use futures::stream::BoxStream;

use super::error::BoxError;

/// Lazily produced patches of an incremental result
///
/// The stream is consumed once, in order. An `Err` item signals that the
/// producer failed and no further patches will follow.
pub type PatchStream = BoxStream<'static, Result<String, BoxError>>;

/// Status and headers requested for a single response
#[derive(Debug, Clone, Default)]
pub struct ResponseInit {
    /// Defaults to `200 OK` when unset
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
}

impl ResponseInit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// Successful result of one execution
pub enum ExecutionOutcome {
    /// One complete body
    Single { body: String, init: ResponseInit },
    /// Initial payload followed by incremental patches
    Streamed { patches: PatchStream },
}

impl ExecutionOutcome {
    pub fn single(body: impl Into<String>, init: ResponseInit) -> Self {
        ExecutionOutcome::Single {
            body: body.into(),
            init,
        }
    }

    pub fn streamed(patches: PatchStream) -> Self {
        ExecutionOutcome::Streamed { patches }
    }
}

impl std::fmt::Debug for ExecutionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionOutcome::Single { body, init } => f
                .debug_struct("Single")
                .field("body", body)
                .field("init", init)
                .finish(),
            ExecutionOutcome::Streamed { .. } => f.debug_struct("Streamed").finish_non_exhaustive(),
        }
    }
}
