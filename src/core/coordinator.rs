//! # Coordinator: throttled, deduplicating request admission and shutdown.
//!
//! The [`Coordinator`] owns the coordination state (running flag, pending
//! queue, result cache, and execution pool) behind a single lock, plus the
//! dispatcher wake handle and the quiescence signal used by [`stop`].
//!
//! ## Key responsibilities
//! - accept submissions while running; silently discard them after stop
//! - wake the dispatcher on every submission, completion, and stop request
//! - block `stop` callers until the drain finishes (queue and pool empty)
//!
//! ## Shutdown path
//! ```text
//! stop()
//!   └─► running = false, publish StopRequested, wake dispatcher
//!         └─► dispatcher drains the queue:
//!                ├─ cache hits   → delivered (even while stopping)
//!                ├─ coalesced    → wait for the in-flight execution
//!                └─ everything else → dropped unresolved
//!             in-flight executions finish (never cancelled)
//!   ┌─► quiescence token cancelled once {stopped, queue ∅, pool ∅}
//! stop() returns
//! ```
//!
//! [`stop`]: Coordinator::stop

use std::collections::{HashSet, VecDeque};

use parking_lot::Mutex;
use tokio::sync::{Notify, broadcast};
use tokio_util::sync::CancellationToken;

use super::builder::CoordinatorBuilder;
use super::cache::ResultCache;
use super::config::Config;
use super::shutdown;
use crate::events::{Bus, Event, EventKind};
use crate::requests::RequestRef;

/// Coordination state guarded by the single coordinator lock.
///
/// Mutated only while holding the lock; request executions and result
/// deliveries always happen after the lock is released.
pub(super) struct State<T> {
    /// False once stop has been requested; no submissions are accepted after.
    pub(super) running: bool,
    /// Submitted-but-unresolved requests, in submission order.
    pub(super) queue: VecDeque<RequestRef<T>>,
    /// Identities currently executing; `len() ≤ throttle_limit` always.
    pub(super) pool: HashSet<String>,
    /// Completed outcomes by identity, FIFO-evicted.
    pub(super) cache: ResultCache<T>,
}

/// Throttled, deduplicating request coordinator.
///
/// Create one with [`Coordinator::builder`]; submit work with
/// [`submit`](Coordinator::submit); drain and stop with
/// [`stop`](Coordinator::stop). See the crate docs for the full lifecycle.
pub struct Coordinator<T> {
    /// Construction-time configuration.
    pub(super) cfg: Config,
    /// Event bus shared with the dispatcher and execution tasks.
    pub(super) bus: Bus,
    /// Coordination state (single-lock policy).
    pub(super) state: Mutex<State<T>>,
    /// Dispatcher wake-up: submissions, completions, and stop requests.
    pub(super) wake: Notify,
    /// Cancelled exactly once, when the coordinator becomes quiescent.
    pub(super) drained: CancellationToken,
}

impl<T> Coordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Returns a builder for a coordinator with the given configuration.
    ///
    /// ## Example
    /// ```rust
    /// use reqvisor::{Config, Coordinator};
    ///
    /// #[tokio::main(flavor = "current_thread")]
    /// async fn main() {
    ///     let coordinator = Coordinator::<String>::builder(Config::new(2, 10)).build();
    ///     assert!(coordinator.is_running());
    ///     coordinator.stop().await;
    ///     assert!(!coordinator.is_running());
    /// }
    /// ```
    pub fn builder(cfg: Config) -> CoordinatorBuilder<T> {
        CoordinatorBuilder::new(cfg)
    }

    /// Assembles a coordinator around an existing bus.
    ///
    /// Called by [`CoordinatorBuilder::build`], which also spawns the
    /// dispatcher for it.
    pub(super) fn from_parts(cfg: Config, bus: Bus) -> Self {
        let cache = ResultCache::new(cfg.cache_capacity);
        Self {
            cfg,
            bus,
            state: Mutex::new(State {
                running: true,
                queue: VecDeque::new(),
                pool: HashSet::new(),
                cache,
            }),
            wake: Notify::new(),
            drained: CancellationToken::new(),
        }
    }

    /// Submits a request for coordination. Fire-and-forget.
    ///
    /// If the coordinator is running, the request joins the pending queue
    /// and resolves asynchronously: via `run` when admitted, or via
    /// `set_result` when its identity's outcome is already cached or becomes
    /// available through a coalesced execution.
    ///
    /// If [`stop`](Coordinator::stop) has been requested, the request is
    /// silently discarded: neither `run` nor `set_result` will be invoked.
    /// Callers must not submit after requesting shutdown.
    ///
    /// Never blocks and returns nothing; there is no error for "coordinator
    /// stopped".
    pub fn submit(&self, request: RequestRef<T>) {
        let queued = {
            let mut state = self.state.lock();
            if state.running {
                let ev = Event::new(EventKind::RequestQueued)
                    .with_id(request.id())
                    .with_depth(state.queue.len() + 1);
                state.queue.push_back(request);
                self.bus.publish(ev);
                true
            } else {
                self.bus
                    .publish(Event::new(EventKind::RequestDiscarded).with_id(request.id()));
                false
            }
        };
        if queued {
            self.wake.notify_one();
        }
    }

    /// Stops the coordinator and drains it. Returns once quiescent.
    ///
    /// Sets the running flag to false (idempotent), wakes the dispatcher,
    /// and waits until the pending queue and the execution pool are both
    /// empty. In-flight executions are never cancelled; queued requests
    /// that are neither cache hits nor coalesced against an in-flight
    /// execution are dropped unresolved (see
    /// [`EventKind::RequestDropped`]).
    ///
    /// Single shutdown owner: must not be called concurrently with itself.
    /// Returns immediately if the coordinator is already quiescent.
    pub async fn stop(&self) {
        {
            let mut state = self.state.lock();
            state.running = false;
            self.bus.publish(Event::new(EventKind::StopRequested));
        }
        self.wake.notify_one();
        self.drained.cancelled().await;
    }

    /// Waits for a termination signal, then runs the
    /// [`stop`](Coordinator::stop) protocol.
    ///
    /// Convenience for binaries embedding a coordinator: `SIGINT`,
    /// `SIGTERM`, and `SIGQUIT` (Ctrl-C on non-unix platforms) trigger the
    /// drain. Returns once quiescent, or with an error if signal
    /// registration fails.
    pub async fn stop_on_signal(&self) -> std::io::Result<()> {
        shutdown::wait_for_shutdown_signal().await?;
        self.stop().await;
        Ok(())
    }

    /// True until [`stop`](Coordinator::stop) has been requested.
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Creates a receiver observing subsequent coordinator events.
    ///
    /// Independent of the [`Subscribe`](crate::Subscribe) fan-out; useful
    /// for ad-hoc inspection and tests.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }
}
