//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] stands in for the coordination layer's event subscription:
//! it announces steps that are ready to be worked on. It is designed to
//! be shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use mediagen_core::StepId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event type announcing that a step is waiting to be processed.
pub const STEP_PENDING: &str = "step.pending";

// ---------------------------------------------------------------------------
// StepEvent
// ---------------------------------------------------------------------------

/// A notification about a step tracked by the coordination layer.
///
/// The event carries only the step identity; handlers fetch the step's
/// details from the [`StepStore`](crate::steps::StepStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEvent {
    /// Dot-separated event name, e.g. `"step.pending"`.
    pub event_type: String,

    /// The step the event refers to.
    pub step_id: StepId,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl StepEvent {
    pub fn new(event_type: impl Into<String>, step_id: StepId) -> Self {
        Self {
            event_type: event_type.into(),
            step_id,
            timestamp: Utc::now(),
        }
    }

    /// Shorthand for a [`STEP_PENDING`] event.
    pub fn pending(step_id: StepId) -> Self {
        Self::new(STEP_PENDING, step_id)
    }

    pub fn is_pending(&self) -> bool {
        self.event_type == STEP_PENDING
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// When the buffer is full, the oldest un-consumed messages are dropped and
/// slow receivers observe a `RecvError::Lagged`.
pub struct EventBus {
    sender: broadcast::Sender<StepEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: StepEvent) {
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StepEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
