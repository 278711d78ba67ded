use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::bus::{EventBus, MacroEvent};

/// A step in the life of one macro invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressUpdate {
    /// The working set is known.
    Started { total: usize },
    /// A batch of widget operations finished.
    Progress { done: usize, total: usize },
    Completed {
        succeeded: usize,
        failed: usize,
        unresolved: usize,
    },
    Failed { error: String },
}

impl ProgressUpdate {
    /// Value of the `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Progress { .. } => "progress",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Receiver of progress updates for a single macro invocation.
pub trait ProgressSink: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _update: ProgressUpdate) {}
}

/// Forwards updates into an unbounded channel. A closed receiver is ignored.
impl ProgressSink for mpsc::UnboundedSender<ProgressUpdate> {
    fn report(&self, update: ProgressUpdate) {
        let _ = self.send(update);
    }
}

/// Publishes updates on an [`EventBus`] tagged with one operation id.
pub struct BusProgress {
    bus: Arc<EventBus>,
    operation_id: String,
    macro_name: String,
}

impl BusProgress {
    pub fn new(bus: Arc<EventBus>, operation_id: impl Into<String>, macro_name: impl Into<String>) -> Self {
        Self {
            bus,
            operation_id: operation_id.into(),
            macro_name: macro_name.into(),
        }
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }
}

impl ProgressSink for BusProgress {
    fn report(&self, update: ProgressUpdate) {
        tracing::debug!(
            operation_id = %self.operation_id,
            macro_name = %self.macro_name,
            update = ?update,
            "Macro progress",
        );
        self.bus.publish(MacroEvent::new(
            self.operation_id.clone(),
            self.macro_name.clone(),
            update,
        ));
    }
}
