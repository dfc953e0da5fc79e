// Draft notification events and the sink interface they flow through.
//
// Emission is fire-and-forget: the engine never fails or rolls back a pick
// because a listener is gone. Delivery is best-effort by contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::draft::state::DraftStatus;

/// Events emitted to interested external listeners (UI clients). One per
/// applied pick and one per status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DraftEvent {
    PickApplied {
        league_id: String,
        team_id: String,
        player_id: String,
        player_name: String,
        pick_number: u32,
        round: u32,
        /// Draft status after the pick (picks can complete the draft).
        status: DraftStatus,
    },
    StatusChanged {
        league_id: String,
        status: DraftStatus,
    },
}

impl DraftEvent {
    /// The league the event belongs to.
    pub fn league_id(&self) -> &str {
        match self {
            DraftEvent::PickApplied { league_id, .. } => league_id,
            DraftEvent::StatusChanged { league_id, .. } => league_id,
        }
    }
}

/// Destination for draft events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Deliver an event. Must not fail the caller; implementations swallow
    /// their own delivery errors.
    async fn emit(&self, event: DraftEvent);
}

/// Sink that fans events out over a tokio broadcast channel. The WebSocket
/// server subscribes one receiver per connected client.
pub struct BroadcastSink {
    tx: broadcast::Sender<DraftEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Handle for spawning subscribers (e.g. the WebSocket server).
    pub fn sender(&self) -> broadcast::Sender<DraftEvent> {
        self.tx.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DraftEvent> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl EventSink for BroadcastSink {
    async fn emit(&self, event: DraftEvent) {
        // send() errs only when there are no subscribers; that is fine.
        if self.tx.send(event).is_err() {
            debug!("draft event dropped: no subscribers");
        }
    }
}

/// Sink that discards everything. Default for embedded/test setups.
pub struct NullSink;

#[async_trait]
impl EventSink for NullSink {
    async fn emit(&self, _event: DraftEvent) {}
}
