//! Typed turn events streamed to the transport layer.
//!
//! Consumers relay these verbatim; ordering is the emission order, enforced
//! by a bounded channel with backpressure. A dropped receiver surfaces as
//! [`CoreError::StreamClosed`] so producers stop rather than narrate into
//! the void.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{CoreError, Result};
use crate::types::{GridPos, LocationId, PresentNpc, Tension};

/// One event in a turn's outward stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// A tool or pipeline stage started; shown as a progress notice.
    Progress {
        /// Short human-readable stage description.
        message: String,
    },
    /// A chunk of narrative prose.
    Narrative {
        /// The text chunk, in emission order.
        text: String,
    },
    /// Snapshot of scene entities after reconciliation.
    Scene {
        /// Current tension level.
        tension: Tension,
        /// NPCs present, with their records.
        npcs: Vec<PresentNpc>,
    },
    /// The player discovered a location.
    Discovery {
        /// Name of the discovered location.
        name: String,
    },
    /// Outcome of a skill check.
    SkillCheck {
        /// Which skill was tested.
        skill: String,
        /// Whether it succeeded.
        success: bool,
    },
    /// A quest progressed.
    QuestUpdate {
        /// Quest name.
        quest: String,
        /// What changed.
        note: String,
    },
    /// A location's grid or occupancy changed.
    GridUpdated {
        /// The affected location.
        location: LocationId,
        /// The player's position, when it changed.
        player: Option<GridPos>,
    },
    /// The world reacted on its own (world tick output).
    WorldReaction {
        /// Reaction prose.
        text: String,
    },
    /// Terminal marker; nothing follows for this turn.
    Done,
}

/// Sending half of a turn's event stream.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::Sender<TurnEvent>,
}

impl EventSink {
    /// Build a bounded stream pair.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<TurnEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Emit one event, awaiting channel capacity.
    ///
    /// # Errors
    /// [`CoreError::StreamClosed`] when the consumer has gone away.
    pub async fn send(&self, event: TurnEvent) -> Result<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| CoreError::StreamClosed)
    }

    /// Whether the consumer is still listening.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}
