//! # Lifecycle events emitted by the coordinator.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Queue events**: submission flow (queued, discarded after stop)
//! - **Execution events**: admission and completion of request executions
//! - **Cache events**: hits, insertions, FIFO evictions
//! - **Shutdown events**: stop request, drain-dropped items, quiescence
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! request identity, reasons, and queue/pool occupancy.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically, assigned at construction. Events for one identity are
//! constructed at the state transition they describe (under the coordinator
//! lock), so comparing `seq` restores the per-identity order even when
//! delivery interleaves.
//!
//! ## Example
//! ```rust
//! use reqvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RequestFailed)
//!     .with_id("user:42")
//!     .with_reason("connection refused");
//!
//! assert_eq!(ev.kind, EventKind::RequestFailed);
//! assert_eq!(ev.id.as_deref(), Some("user:42"));
//! assert_eq!(ev.reason.as_deref(), Some("connection refused"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of coordinator events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Queue events ===
    /// Request accepted into the pending queue.
    ///
    /// Sets:
    /// - `id`: request identity
    /// - `depth`: queue length after insertion
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RequestQueued,

    /// Request submitted after a stop request and silently discarded
    /// (neither `run` nor `set_result` will be invoked on it).
    ///
    /// Sets:
    /// - `id`: request identity
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RequestDiscarded,

    // === Execution events ===
    /// Request admitted into the execution pool; its `run` is being spawned.
    ///
    /// Sets:
    /// - `id`: request identity
    /// - `in_flight`: pool size after admission
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RequestAdmitted,

    /// Request execution finished with a value.
    ///
    /// Sets:
    /// - `id`: request identity
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RequestCompleted,

    /// Request execution finished with an error.
    ///
    /// The outcome is still cached/delivered verbatim; this event only
    /// classifies the completion for observers.
    ///
    /// Sets:
    /// - `id`: request identity
    /// - `reason`: error message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RequestFailed,

    // === Cache events ===
    /// Queued request resolved from the cache via `set_result`.
    ///
    /// Applies unconditionally, even while stopping.
    ///
    /// Sets:
    /// - `id`: request identity
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    CacheHit,

    /// Completed outcome inserted into the cache.
    ///
    /// Sets:
    /// - `id`: request identity
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    CacheStored,

    /// Oldest cache entry evicted to make room (strict FIFO order).
    ///
    /// Sets:
    /// - `id`: evicted identity
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    CacheEvicted,

    // === Shutdown events ===
    /// Stop requested; no further submissions will be accepted.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    StopRequested,

    /// Queued request removed unresolved during the stopping drain
    /// (it was neither a cache hit nor coalesced against an execution).
    ///
    /// Sets:
    /// - `id`: request identity
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    RequestDropped,

    /// Queue and execution pool are empty after a stop request; the
    /// dispatcher has exited and `stop` is about to return.
    ///
    /// Sets:
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    Drained,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `id`: subscriber name
    /// - `reason`: panic info/message
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `id`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SubscriberOverflow,
}

/// Coordinator event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Request identity (or subscriber name for subscriber events).
    pub id: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Pending-queue length, where applicable.
    pub depth: Option<usize>,
    /// Execution-pool size, where applicable.
    pub in_flight: Option<usize>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            id: None,
            reason: None,
            depth: None,
            in_flight: None,
        }
    }

    /// Attaches a request identity (or subscriber name).
    #[inline]
    pub fn with_id(mut self, id: impl Into<Arc<str>>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the pending-queue length.
    #[inline]
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Attaches the execution-pool size.
    #[inline]
    pub fn with_in_flight(mut self, in_flight: usize) -> Self {
        self.in_flight = Some(in_flight);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_id(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_id(subscriber)
            .with_reason(info)
    }

    /// True for events generated by the fan-out machinery itself.
    #[inline]
    pub fn is_subscriber_fault(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}
