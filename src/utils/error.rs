//! Error types for the entire crate.
//!
//! We use `thiserror` for library-style errors with custom types.
//! Internal invariant violations (not caller mistakes) panic instead,
//! since they signal a bug in the builder rather than bad input.

use thiserror::Error;

/// Errors that can occur while decoding probe events
#[derive(Error, Debug)]
pub enum EventError {
    #[error("JSON deserialization failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid event payload: {0}")]
    InvalidFormat(String),
}

/// Errors that can occur during call-tree queries and mutations
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Invocation with UUID {0} not found")]
    UnknownUuid(String),

    #[error("No node registered for key {0}")]
    UnknownKey(String),
}
