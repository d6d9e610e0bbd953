//! # Dispatcher: scan passes over the pending queue.
//!
//! A single dispatcher task matches queued requests against cache and pool
//! state. Each wake performs **scan passes** until none is possible; a pass
//! walks the queue front-to-back and, for the first eligible item, takes
//! exactly one action:
//!
//! ```text
//! for each queued item, front to back:
//!   ├─ identity cached         → deliver cached outcome, done
//!   │                            (unconditionally, even while stopping)
//!   ├─ identity in pool        → skip (coalesced wait), keep scanning
//!   ├─ not running             → remove unresolved (shutdown drop), done
//!   ├─ pool below throttle     → admit: spawn run(), done
//!   └─ otherwise               → keep scanning
//! no item matched → suspend until woken
//! ```
//!
//! ## Rules
//! - The dispatcher suspends instead of re-scanning when a pass takes no
//!   action; submissions, stop requests, and every execution completion
//!   (slot release / cache insertion) wake it.
//! - Admitted executions run outside the lock, concurrently with the
//!   dispatcher and each other.
//! - The dispatcher exits, cancelling the quiescence token, when the
//!   coordinator is stopped and both the queue and the pool are empty.

use std::sync::Arc;

use super::coordinator::Coordinator;
use crate::events::{Event, EventKind};
use crate::requests::{Outcome, RequestRef};

/// Result of one scan pass.
enum Scan<T> {
    /// Took one action; re-enter immediately.
    Acted,
    /// Admitted a request into the pool; the caller spawns its execution.
    Admitted(RequestRef<T>),
    /// Nothing eligible; wait for a wake.
    Idle,
    /// Stopped with queue and pool empty; the dispatcher exits.
    Quiescent,
}

/// Decision taken against the first eligible queued item.
enum Action<T> {
    /// Resolve from the cache via `set_result`.
    Deliver { index: usize, outcome: Outcome<T> },
    /// Remove unresolved (stopping drain).
    Discard { index: usize },
    /// Move into the execution pool.
    Admit { index: usize },
}

impl<T> Coordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Runs the dispatcher until the coordinator drains after a stop.
    pub(super) async fn run_dispatcher(self: Arc<Self>) {
        loop {
            match self.scan_once() {
                Scan::Acted => {}
                Scan::Admitted(request) => {
                    tokio::spawn(Arc::clone(&self).execute(request));
                }
                Scan::Idle => self.wake.notified().await,
                Scan::Quiescent => {
                    self.bus.publish(Event::new(EventKind::Drained));
                    self.drained.cancel();
                    break;
                }
            }
        }
    }

    /// Performs one scan pass; takes at most one action.
    fn scan_once(&self) -> Scan<T> {
        let mut state = self.state.lock();

        if !state.running && state.queue.is_empty() && state.pool.is_empty() {
            return Scan::Quiescent;
        }

        let throttle = self.cfg.throttle_limit_clamped();
        let mut action = None;
        for (index, request) in state.queue.iter().enumerate() {
            let id = request.id();
            if let Some(outcome) = state.cache.get(id) {
                action = Some(Action::Deliver {
                    index,
                    outcome: outcome.clone(),
                });
                break;
            }
            if state.pool.contains(id) {
                // Coalesced wait: this identity is executing; items further
                // back may still be eligible.
                continue;
            }
            if !state.running {
                action = Some(Action::Discard { index });
                break;
            }
            if state.pool.len() < throttle {
                action = Some(Action::Admit { index });
                break;
            }
        }

        let Some(action) = action else {
            return Scan::Idle;
        };

        match action {
            Action::Deliver { index, outcome } => {
                let Some(request) = state.queue.remove(index) else {
                    return Scan::Acted;
                };
                self.bus
                    .publish(Event::new(EventKind::CacheHit).with_id(request.id()));
                drop(state);
                request.set_result(outcome);
                Scan::Acted
            }
            Action::Discard { index } => {
                let Some(request) = state.queue.remove(index) else {
                    return Scan::Acted;
                };
                self.bus
                    .publish(Event::new(EventKind::RequestDropped).with_id(request.id()));
                Scan::Acted
            }
            Action::Admit { index } => {
                let Some(request) = state.queue.remove(index) else {
                    return Scan::Acted;
                };
                let id = request.id().to_owned();
                state.pool.insert(id.clone());
                self.bus.publish(
                    Event::new(EventKind::RequestAdmitted)
                        .with_id(id)
                        .with_in_flight(state.pool.len()),
                );
                Scan::Admitted(request)
            }
        }
    }

    /// Runs one admitted request to completion and releases its pool slot.
    ///
    /// The outcome is cached when the request allows it, regardless of the
    /// running flag, so coalesced duplicates of a stopping coordinator still
    /// resolve as cache hits.
    async fn execute(self: Arc<Self>, request: RequestRef<T>) {
        let outcome = request.run().await;
        let cacheable = request.cacheable();
        let id: Arc<str> = request.id().into();

        {
            let mut state = self.state.lock();
            match &outcome {
                Ok(_) => self
                    .bus
                    .publish(Event::new(EventKind::RequestCompleted).with_id(Arc::clone(&id))),
                Err(err) => self.bus.publish(
                    Event::new(EventKind::RequestFailed)
                        .with_id(Arc::clone(&id))
                        .with_reason(err.to_string()),
                ),
            }
            if cacheable {
                let stored = self.cfg.cache_capacity > 0;
                let evicted = state.cache.insert(id.to_string(), outcome);
                if stored {
                    self.bus
                        .publish(Event::new(EventKind::CacheStored).with_id(Arc::clone(&id)));
                }
                if let Some(evicted) = evicted {
                    self.bus
                        .publish(Event::new(EventKind::CacheEvicted).with_id(evicted));
                }
            }
            state.pool.remove(id.as_ref());
        }
        // Slot freed, possibly with a fresh cache entry: let the dispatcher
        // re-evaluate coalesced waiters and, while stopping, the drain state.
        self.wake.notify_one();
    }
}
