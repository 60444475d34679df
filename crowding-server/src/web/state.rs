//! Application state for the web layer.

use std::sync::Arc;

use crate::engine::CrowdingEngine;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<CrowdingEngine>,

    /// Cleanup age used when a request does not name one, in hours.
    pub retention_hours: i64,
}

impl AppState {
    pub fn new(engine: CrowdingEngine, retention_hours: i64) -> Self {
        Self {
            engine: Arc::new(engine),
            retention_hours,
        }
    }
}
