//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! [`SubscriberSet`] distributes each [`Event`] to multiple subscribers
//! **without awaiting** their processing.
//!
//! ## What it guarantees
//! - `emit(&Event)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside subscribers are caught and reported (isolation).
//!
//! ## What it does **not** guarantee
//! - No global ordering across different subscribers.
//! - No retries on per-subscriber queue overflow (events are dropped for
//!   that subscriber).
//!
//! ## Diagram
//! ```text
//!    emit(&Event)
//!        │                        (Arc-clone per subscriber)
//!        ├────────────────► [queue S1] ─► worker S1 ─► on_event()
//!        ├────────────────► [queue S2] ─► worker S2 ─► on_event()
//!        └────────────────► [queue SN] ─► worker SN ─► on_event()
//! ```

use std::any::Any;
use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use super::Subscribe;
use crate::events::{Bus, Event};

/// Handle to one subscriber's queue.
struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber.
    ///
    /// Each subscriber gets a bounded MPSC queue of size
    /// `max(queue_capacity, 1)`. Worker isolation: panics are caught and
    /// reported as `SubscriberPanicked` on the bus.
    #[must_use]
    pub fn new(subscribers: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut lanes = Vec::with_capacity(subscribers.len());
        let mut workers = Vec::with_capacity(subscribers.len());

        for subscriber in subscribers {
            let name = subscriber.name();
            let (tx, rx) = mpsc::channel::<Arc<Event>>(subscriber.queue_capacity().max(1));
            workers.push(tokio::spawn(Self::drive(subscriber, rx, bus.clone())));
            lanes.push(Lane { name, tx });
        }

        Self { lanes, workers, bus }
    }

    /// Worker loop for one subscriber: drain the queue, isolate panics.
    async fn drive(subscriber: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
        while let Some(ev) = rx.recv().await {
            let handled = std::panic::AssertUnwindSafe(subscriber.on_event(ev.as_ref()))
                .catch_unwind()
                .await;
            if let Err(payload) = handled {
                bus.publish(Event::subscriber_panicked(
                    subscriber.name(),
                    panic_message(payload.as_ref()),
                ));
            }
        }
    }

    /// Fan-out one event to all subscribers (non-blocking).
    ///
    /// If a subscriber's queue is **full** or **closed**, the event is
    /// dropped for it and a `SubscriberOverflow` event is published;
    /// unless the event itself is a subscriber fault, which is never
    /// re-reported (that would loop).
    pub fn emit(&self, event: &Event) {
        let suppress_faults = event.is_subscriber_fault();

        let ev = Arc::new(event.clone());
        for lane in &self.lanes {
            let reason = match lane.tx.try_send(Arc::clone(&ev)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !suppress_faults {
                self.bus.publish(Event::subscriber_overflow(lane.name, reason));
            }
        }
    }

    /// Graceful shutdown: close all queues and await worker completion.
    pub async fn shutdown(self) {
        drop(self.lanes);
        for worker in self.workers {
            let _ = worker.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }
}

/// Extracts a printable message from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
