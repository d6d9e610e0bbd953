//! # reqvisor
//!
//! **Reqvisor** is a throttled, deduplicating request coordinator for Rust.
//!
//! It accepts identified units of work ([`Request`]s), executes at most a
//! bounded number of them concurrently, coalesces redundant concurrent
//! executions of the same identity, optionally caches completed results
//! (bounded, FIFO-evicted), and drains gracefully on stop.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  RequestRef  │   │  RequestRef  │   │  RequestRef  │
//!     │ (caller #1)  │   │ (caller #2)  │   │ (caller #3)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼ submit()         ▼ submit()         ▼ submit()
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Coordinator (single lock: running flag, queue, cache, pool)      │
//! │  - pending queue (FIFO)                                           │
//! │  - result cache (identity → outcome, FIFO eviction)               │
//! │  - execution pool (identity set, ≤ throttle limit)                │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼ dispatcher (one action per scan pass)
//!                       ┌─────────────────┐
//!                       │    scan pass    │  cache hit      → set_result(outcome)
//!                       │ (front-to-back, │  coalesced wait → leave queued
//!                       │ first eligible) │  stopping drop  → remove unresolved
//!                       └────────┬────────┘  admission      → spawn run()
//!                                │
//!                                │ Publishes Events:
//!                                │ - RequestQueued / RequestAdmitted
//!                                │ - CacheHit / CacheStored / CacheEvicted
//!                                │ - RequestCompleted / RequestDropped / Drained
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                          SubscriberSet fan-out
//!                        (per-subscriber queues + workers)
//! ```
//!
//! ### Request lifecycle
//! ```text
//! submit(request)
//!   ├─ coordinator stopped → discarded (no run, no set_result)
//!   └─ enqueued → dispatcher scan:
//!        ├─ identity cached        → set_result(cached outcome)  [even while stopping]
//!        ├─ identity executing     → wait in queue (coalesced)
//!        ├─ stopping, un-coalesced → dropped unresolved
//!        └─ pool has capacity      → run() spawned concurrently
//!             └─ on completion: cacheable() → cache (FIFO-evict oldest),
//!                free the pool slot, wake the dispatcher
//! ```
//!
//! Exactly one of `run` / `set_result` is invoked per submitted request,
//! exactly once. The exception: requests still queued when a stop request
//! finishes draining, which receive neither.
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                         |
//! |-------------------|--------------------------------------------------------------|--------------------------------------------|
//! | **Requests**      | Define units of work with identity, execution, and delivery. | [`Request`], [`RequestFn`], [`RequestRef`] |
//! | **Coordination**  | Throttling, coalescing, bounded FIFO result caching.         | [`Coordinator`], [`Config`]                |
//! | **Shutdown**      | Drain-and-stop barrier; in-flight work is never cancelled.   | [`Coordinator::stop`]                      |
//! | **Subscriber API**| Hook into coordinator lifecycle events (logging, metrics).   | [`Subscribe`], [`FlightTracker`]           |
//! | **Errors**        | Opaque, cloneable execution errors delivered verbatim.       | [`RequestError`], [`Outcome`]              |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use reqvisor::{Config, Coordinator, Outcome, RequestFn, RequestRef};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let coordinator = Coordinator::<String>::builder(Config::default()).build();
//!     let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//!
//!     // First submission of an identity executes.
//!     let primary: RequestRef<String> = RequestFn::arc(
//!         "user:42",
//!         true,
//!         || async { Ok("profile".to_string()) },
//!         |_outcome| {},
//!     );
//!
//!     // A concurrent duplicate never executes: it is delivered the
//!     // primary's outcome via set_result (coalescing + cache).
//!     let duplicate: RequestRef<String> = RequestFn::arc(
//!         "user:42",
//!         true,
//!         || async { Ok(String::new()) },
//!         move |outcome: Outcome<String>| {
//!             let _ = tx.send(outcome);
//!         },
//!     );
//!
//!     coordinator.submit(primary);
//!     coordinator.submit(duplicate);
//!
//!     assert_eq!(rx.recv().await, Some(Ok("profile".to_string())));
//!     coordinator.stop().await;
//! }
//! ```

mod core;
mod error;
mod events;
mod requests;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{Config, Coordinator, CoordinatorBuilder};
pub use error::RequestError;
pub use events::{Bus, Event, EventKind};
pub use requests::{Outcome, Request, RequestFn, RequestRef};
pub use subscribers::{FlightTracker, Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
