//! Request contract: the unit of work the coordinator manages but never
//! constructs.
//!
//! Public modules:
//! - [`request`]: the [`Request`] trait, the shared [`RequestRef`] handle,
//!   and the [`Outcome`] payload alias;
//! - [`request_fn`]: closure-backed [`RequestFn`] implementation.

mod request;
mod request_fn;

pub use request::{Outcome, Request, RequestRef};
pub use request_fn::RequestFn;
