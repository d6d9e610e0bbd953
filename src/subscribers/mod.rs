//! Subscriber API: non-blocking fan-out of coordinator events.
//!
//! Public modules:
//! - [`subscribe`]: the [`Subscribe`] trait (extension point);
//! - [`subscribe_set`]: the [`SubscriberSet`] fan-out with per-subscriber
//!   queues and workers;
//! - [`flight`]: the [`FlightTracker`] identity-phase tracker;
//! - `log`: the [`LogWriter`] stdout subscriber (feature `logging`).

mod flight;
mod subscribe;
mod subscribe_set;

pub use flight::FlightTracker;
pub use subscribe::Subscribe;
pub use subscribe_set::SubscriberSet;

#[cfg(feature = "logging")]
mod log;
#[cfg(feature = "logging")]
pub use log::LogWriter;
