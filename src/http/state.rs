use crate::broadcast::BroadcastEngine;
use crate::listeners::{GeoLookup, ListenerRegistry};

/// Shared application state injected into all route handlers via axum::extract::State.
/// Every field is a cheap-to-clone handle onto shared internals.
#[derive(Clone)]
pub struct AppState {
    pub engine: BroadcastEngine,
    pub registry: ListenerRegistry,
    pub geo: GeoLookup,
    /// Trailing window for "current listeners" on the stats endpoint.
    pub current_window: chrono::Duration,
}
