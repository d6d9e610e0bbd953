//! # Closure-backed request (`RequestFn`)
//!
//! [`RequestFn`] wraps an execution closure `F: Fn() -> Fut` and a delivery
//! closure `D: Fn(Outcome<T>)`, producing a fresh future per `run` call. No
//! shared mutable state is required; if the closures need common state, put
//! it behind an explicit `Arc`.
//!
//! The one-shot contract (at most one `run` / `set_result` invocation) is the
//! coordinator's to honor; `RequestFn` does not police it.
//!
//! ## Example
//! ```rust
//! use reqvisor::{Outcome, Request, RequestFn, RequestRef};
//!
//! let r: RequestRef<String> = RequestFn::arc(
//!     "user:7",
//!     true,
//!     || async { Ok("payload".to_string()) },
//!     |_outcome: Outcome<String>| {
//!         // delivered from cache or a coalesced execution
//!     },
//! );
//!
//! assert_eq!(r.id(), "user:7");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::requests::request::{Outcome, Request};

/// Closure-backed request implementation.
///
/// Wraps an execution closure that *creates* a new future per `run` call and
/// a delivery closure for the `set_result` path.
pub struct RequestFn<F, D> {
    id: Cow<'static, str>,
    cacheable: bool,
    exec: F,
    deliver: D,
}

impl<F, D> RequestFn<F, D> {
    /// Creates a new closure-backed request.
    ///
    /// Prefer [`RequestFn::arc`] when you immediately need a
    /// [`RequestRef`](crate::RequestRef).
    pub fn new(id: impl Into<Cow<'static, str>>, cacheable: bool, exec: F, deliver: D) -> Self {
        Self {
            id: id.into(),
            cacheable,
            exec,
            deliver,
        }
    }

    /// Creates the request and returns it as a shared handle.
    ///
    /// ## Example
    /// ```rust
    /// use reqvisor::{Outcome, Request, RequestFn, RequestRef};
    ///
    /// let r: RequestRef<u32> = RequestFn::arc(
    ///     "answer",
    ///     false,
    ///     || async { Ok(42u32) },
    ///     |_outcome: Outcome<u32>| {},
    /// );
    /// assert!(!r.cacheable());
    /// ```
    pub fn arc(id: impl Into<Cow<'static, str>>, cacheable: bool, exec: F, deliver: D) -> Arc<Self> {
        Arc::new(Self::new(id, cacheable, exec, deliver))
    }
}

#[async_trait]
impl<T, F, Fut, D> Request for RequestFn<F, D>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Outcome<T>> + Send + 'static,
    D: Fn(Outcome<T>) + Send + Sync + 'static,
{
    type Value = T;

    fn id(&self) -> &str {
        &self.id
    }

    async fn run(&self) -> Outcome<T> {
        (self.exec)().await
    }

    fn cacheable(&self) -> bool {
        self.cacheable
    }

    fn set_result(&self, outcome: Outcome<T>) {
        (self.deliver)(outcome)
    }
}
