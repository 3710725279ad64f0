// Core data model for the HTTP adapter
// Request, outcome, and failure types shared by the engine and server layers

//! # Data Model Module
//!
//! These types are created fresh for every inbound request and dropped once
//! its response is closed. Nothing here is shared across requests.
//!
//! ## Rust Learning Notes:
//!
//! ### Re-exports for Clean APIs
//! The `pub use` statements at the bottom create a flat API, so callers write
//! `use gql_http_adapter::models::ExecutionOutcome` instead of reaching into
//! `models::outcome`.

// Inbound side: RequestMethod, RawRequest, RequestDescriptor
pub mod request;

// Success side: ExecutionOutcome, ResponseInit, PatchStream
pub mod outcome;

// Failure side: HttpQueryError, ExecutionError
pub mod error;

pub use error::{BoxError, ExecutionError, HttpQueryError};
pub use outcome::{ExecutionOutcome, PatchStream, ResponseInit};
pub use request::{RawRequest, RequestDescriptor, RequestMethod};
