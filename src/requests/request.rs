//! # Request abstraction and shared handle type.
//!
//! This module defines the [`Request`] trait (async, identity-keyed) and the
//! common handle type [`RequestRef`], an `Arc<dyn Request>` suitable for
//! sharing between the submitting caller and the coordinator.
//!
//! A request's identity is its deduplication and caching key: two requests
//! with equal ids are the same logical request and may share one execution.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RequestError;

/// The opaque `(value, error)` payload produced by a request execution.
///
/// The coordinator treats outcomes as sealed cargo: it caches them and
/// delivers them verbatim, hence the `Clone` bound on the value type.
pub type Outcome<T> = Result<T, RequestError>;

/// # Identified, coalescible unit of work.
///
/// A `Request` exposes a stable [`id`](Request::id), an async
/// [`run`](Request::run) producing an [`Outcome`], a
/// [`cacheable`](Request::cacheable) flag, and a one-shot
/// [`set_result`](Request::set_result) delivery callback.
///
/// ## Contract
/// - The coordinator invokes **exactly one** of `run` / `set_result` per
///   submitted request, exactly once: `run` when the request is admitted for
///   execution, `set_result` when its outcome is obtained elsewhere (cache
///   hit, or a coalesced duplicate's execution). Requests still queued when a
///   stop request finishes draining receive neither.
/// - `run` may suspend for arbitrary external duration; the coordinator never
///   cancels it and applies no timeout.
/// - `cacheable` is only consulted after `run` has completed; its value
///   before that point is unspecified.
/// - Invoking `run` or `set_result` a second time (or both) on one request is
///   a programmer error in the request implementation. Implementations should
///   treat it as a precondition failure; the coordinator cannot detect it.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use reqvisor::{Outcome, Request};
///
/// struct Lookup {
///     key: String,
/// }
///
/// #[async_trait]
/// impl Request for Lookup {
///     type Value = u64;
///
///     fn id(&self) -> &str {
///         &self.key
///     }
///
///     async fn run(&self) -> Outcome<u64> {
///         // do work...
///         Ok(42)
///     }
///
///     fn cacheable(&self) -> bool {
///         true
///     }
///
///     fn set_result(&self, _outcome: Outcome<u64>) {
///         // hand the shared outcome to whoever is waiting on this request
///     }
/// }
/// ```
#[async_trait]
pub trait Request: Send + Sync + 'static {
    /// Result value type carried by this request's [`Outcome`].
    type Value: Clone + Send + Sync + 'static;

    /// Returns the identity of the request.
    ///
    /// Requests with equal ids are the same logical request: at most one of
    /// them executes at a time, and a cached outcome resolves all of them.
    fn id(&self) -> &str;

    /// Executes the request, producing its outcome.
    ///
    /// Invoked at most once per request, ever. Runs outside the coordinator
    /// lock, concurrently with the dispatcher and other admitted executions.
    async fn run(&self) -> Outcome<Self::Value>;

    /// Whether the completed outcome may populate the result cache.
    ///
    /// Consulted once, after `run` returns. Never consulted on requests
    /// resolved via [`set_result`](Request::set_result).
    fn cacheable(&self) -> bool;

    /// Delivers an outcome obtained without executing this request.
    ///
    /// Invoked at most once, and never on a request whose `run` was invoked.
    /// Called outside the coordinator lock; implementations should still
    /// return promptly (hand off to a channel rather than doing work inline).
    fn set_result(&self, outcome: Outcome<Self::Value>);
}

/// Shared request handle (`Arc<dyn Request>`).
pub type RequestRef<T> = Arc<dyn Request<Value = T>>;
