//! # Builder: wires the bus, subscribers, and background tasks.
//!
//! [`CoordinatorBuilder::build`] assembles a [`Coordinator`] and spawns its
//! dispatcher, plus (when subscribers are attached) a listener that
//! forwards bus events into the [`SubscriberSet`] fan-out.

use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::broadcast;

use super::config::Config;
use super::coordinator::Coordinator;
use crate::events::{Bus, Event};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Builder for constructing a [`Coordinator`] with optional subscribers.
pub struct CoordinatorBuilder<T> {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    _value: PhantomData<fn() -> T>,
}

impl<T> CoordinatorBuilder<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            _value: PhantomData,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive coordinator events (submissions, admissions,
    /// cache activity, drain progress) through dedicated workers with
    /// bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the coordinator and starts its background tasks.
    ///
    /// Spawns the dispatcher and, if subscribers were attached, the bus
    /// listener feeding the fan-out set. Must be called within a tokio
    /// runtime.
    pub fn build(self) -> Arc<Coordinator<T>> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        if !self.subscribers.is_empty() {
            let set = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
            spawn_listener(bus.subscribe(), set);
        }

        let coordinator = Arc::new(Coordinator::from_parts(self.cfg, bus));
        tokio::spawn(Arc::clone(&coordinator).run_dispatcher());
        coordinator
    }
}

/// Forwards bus events to the subscriber set (fire-and-forget).
///
/// Ends when the bus closes, i.e. when the coordinator is dropped; lagging
/// skips missed events rather than terminating the listener.
fn spawn_listener(mut rx: broadcast::Receiver<Event>, set: Arc<SubscriberSet>) {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => set.emit(&ev),
                Err(broadcast::error::RecvError::Closed) => break,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
            }
        }
    });
}
