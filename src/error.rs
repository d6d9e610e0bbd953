//! Error type carried by request outcomes.
//!
//! [`RequestError`] is the error half of the opaque `(value, error)` payload a
//! request execution produces. The coordinator never constructs or inspects
//! it: whatever `run` returns is cached and delivered verbatim to every
//! coalesced or cached resolution of the same identity. Because of that, the
//! type is `Clone` (one outcome may be delivered to many requests) and
//! `PartialEq` (callers routinely compare delivered outcomes).
//!
//! The helper methods (`as_label`, `as_message`) exist for logging/metrics in
//! request implementations and subscribers.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by request execution.
///
/// These belong to the request layer: `run` implementations return them, the
/// coordinator merely stores and forwards them. Failures are never retried by
/// the coordinator.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Request execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Request execution exceeded a caller-imposed deadline.
    ///
    /// The coordinator applies no timeouts of its own; a request that wants
    /// one enforces it inside `run` and reports it with this variant.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },
}

impl RequestError {
    /// Creates a [`RequestError::Fail`] from any displayable error.
    pub fn fail(error: impl Into<String>) -> Self {
        RequestError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use reqvisor::RequestError;
    ///
    /// let err = RequestError::fail("boom");
    /// assert_eq!(err.as_label(), "request_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RequestError::Fail { .. } => "request_failed",
            RequestError::Timeout { .. } => "request_timeout",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RequestError::Fail { error } => format!("error: {error}"),
            RequestError::Timeout { timeout } => format!("timeout: {timeout:?}"),
        }
    }
}
