//! # Simple logging subscriber for debugging and demos.
//!
//! [`LogWriter`] prints events to stdout in a human-readable format.
//! This is primarily useful for development, debugging, and examples.
//!
//! ## Output format
//! ```text
//! [queued] id=user:42 depth=3
//! [admitted] id=user:42 in_flight=2
//! [completed] id=user:42
//! [failed] id=user:42 err="connection refused"
//! [cache-hit] id=user:42
//! [cache-evicted] id=user:7
//! [dropped] id=user:9
//! [stop-requested]
//! [drained]
//! ```

use async_trait::async_trait;

use super::Subscribe;
use crate::events::{Event, EventKind};

/// Simple stdout logging subscriber.
///
/// Enabled via the `logging` feature. Prints human-readable event
/// descriptions to stdout for debugging and demonstration purposes.
///
/// Not intended for production use; implement a custom [`Subscribe`] for
/// structured logging or metrics collection.
#[derive(Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Creates a new stdout logger.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let id = e.id.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::RequestQueued => {
                println!("[queued] id={id} depth={:?}", e.depth);
            }
            EventKind::RequestDiscarded => {
                println!("[discarded] id={id}");
            }
            EventKind::RequestAdmitted => {
                println!("[admitted] id={id} in_flight={:?}", e.in_flight);
            }
            EventKind::RequestCompleted => {
                println!("[completed] id={id}");
            }
            EventKind::RequestFailed => {
                println!("[failed] id={id} err={:?}", e.reason);
            }
            EventKind::CacheHit => {
                println!("[cache-hit] id={id}");
            }
            EventKind::CacheStored => {
                println!("[cache-stored] id={id}");
            }
            EventKind::CacheEvicted => {
                println!("[cache-evicted] id={id}");
            }
            EventKind::RequestDropped => {
                println!("[dropped] id={id}");
            }
            EventKind::StopRequested => {
                println!("[stop-requested]");
            }
            EventKind::Drained => {
                println!("[drained]");
            }
            EventKind::SubscriberPanicked => {
                println!("[subscriber-panic] name={id} info={:?}", e.reason);
            }
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] name={id} reason={:?}", e.reason);
            }
        }
    }

    fn name(&self) -> &'static str {
        "log_writer"
    }
}
