//! # Identity-phase tracker with sequence-based ordering.
//!
//! Maintains an eventually-consistent view of where each request identity
//! stands (pending in the queue, executing in the pool), using event
//! sequence numbers to handle out-of-order delivery.
//!
//! ## Architecture
//! ```text
//! Coordinator ──► Bus ──► bus listener ──► FlightTracker::update()
//!                                                  │
//!                                                  ▼
//!                                  HashMap<String, IdentityState>
//!                                   (id → {last_seq, pending, in_flight})
//! ```
//!
//! ## Rules
//! - `RequestQueued` raises the identity's pending count; `RequestAdmitted`,
//!   `CacheHit`, and `RequestDropped` lower it.
//! - `RequestAdmitted` marks the identity in-flight; `RequestCompleted` /
//!   `RequestFailed` clear it.
//! - Events with a sequence number at or below the last applied one for an
//!   identity are **rejected** (stale).
//! - Read operations (`in_flight`, `pending`) are **eventually consistent**.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::Subscribe;
use crate::events::{Event, EventKind};

/// Per-identity state for ordering validation.
#[derive(Debug, Clone, Default)]
struct IdentityState {
    /// Last applied sequence number for this identity.
    last_seq: Option<u64>,
    /// Number of items with this identity sitting in the pending queue.
    pending: usize,
    /// Whether an execution for this identity is currently in the pool.
    in_flight: bool,
}

/// Thread-safe tracker of request identities in the coordinator.
///
/// ### Responsibilities
/// - Provides snapshots of in-flight identities for shutdown diagnostics
/// - Tracks how many duplicates of an identity are waiting in the queue
/// - Rejects stale events using sequence numbers
pub struct FlightTracker {
    state: RwLock<HashMap<String, IdentityState>>,
}

impl FlightTracker {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(HashMap::new()),
        }
    }

    /// Updates identity state if the event is newer than the last seen.
    ///
    /// Returns `true` if the event changed pending/in-flight state.
    ///
    /// ### State transitions
    /// - `RequestQueued` → pending + 1
    /// - `RequestAdmitted` → pending − 1, in-flight
    /// - `CacheHit` / `RequestDropped` → pending − 1
    /// - `RequestCompleted` / `RequestFailed` → not in-flight
    /// - Other identity-bearing events → sequence update only
    pub async fn update(&self, ev: &Event) -> bool {
        let id = match ev.id.as_deref() {
            Some(id) => id,
            None => return false,
        };

        let mut state = self.state.write().await;
        let entry = state.entry(id.to_string()).or_default();

        if entry.last_seq.is_some_and(|last| ev.seq <= last) {
            return false;
        }
        entry.last_seq = Some(ev.seq);

        match ev.kind {
            EventKind::RequestQueued => {
                entry.pending += 1;
                true
            }
            EventKind::RequestAdmitted => {
                entry.pending = entry.pending.saturating_sub(1);
                entry.in_flight = true;
                true
            }
            EventKind::CacheHit | EventKind::RequestDropped => {
                entry.pending = entry.pending.saturating_sub(1);
                true
            }
            EventKind::RequestCompleted | EventKind::RequestFailed => {
                entry.in_flight = false;
                true
            }
            _ => false,
        }
    }

    /// Returns the sorted list of identities currently executing.
    pub async fn in_flight(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut ids: Vec<String> = state
            .iter()
            .filter(|(_, s)| s.in_flight)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Returns true if an execution for the identity is currently in the pool.
    pub async fn is_in_flight(&self, id: &str) -> bool {
        self.state
            .read()
            .await
            .get(id)
            .map(|s| s.in_flight)
            .unwrap_or(false)
    }

    /// Returns how many items with the identity are waiting in the queue.
    pub async fn pending(&self, id: &str) -> usize {
        self.state
            .read()
            .await
            .get(id)
            .map(|s| s.pending)
            .unwrap_or(0)
    }
}

impl Default for FlightTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Subscribe for FlightTracker {
    async fn on_event(&self, event: &Event) {
        self.update(event).await;
    }

    fn name(&self) -> &'static str {
        "flight_tracker"
    }
}
