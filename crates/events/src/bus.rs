//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] fans [`MacroEvent`]s out to every subscriber (for example
//! the SSE progress stream). It is designed to be shared via
//! `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::progress::ProgressUpdate;

// ---------------------------------------------------------------------------
// MacroEvent
// ---------------------------------------------------------------------------

/// A progress update of one macro invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroEvent {
    /// Id of the macro invocation the update belongs to.
    pub operation_id: String,

    /// Macro name, e.g. `"copy"` or `"auto-grid"`.
    pub macro_name: String,

    #[serde(flatten)]
    pub update: ProgressUpdate,

    /// When the update was published (UTC).
    pub timestamp: DateTime<Utc>,
}

impl MacroEvent {
    pub fn new(
        operation_id: impl Into<String>,
        macro_name: impl Into<String>,
        update: ProgressUpdate,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            macro_name: macro_name.into(),
            update,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// # Usage
///
/// ```rust
/// use zoneops_events::bus::{EventBus, MacroEvent};
/// use zoneops_events::ProgressUpdate;
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(MacroEvent::new("op-1", "copy", ProgressUpdate::Started { total: 3 }));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<MacroEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: MacroEvent) {
        // A send error only means there are no receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MacroEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
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
