use std::sync::Arc;

use zoneops_events::EventBus;
use zoneops_pipeline::MacroEngine;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Macro engine bound to the configured canvas and ledger.
    pub engine: Arc<MacroEngine>,
    /// Progress events of running macros, fanned out to SSE subscribers.
    pub event_bus: Arc<EventBus>,
}
