//! Application state for the HTTP server.

use crate::manager::RecordsManager;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: RecordsManager,
}

impl AppState {
    pub fn new(manager: RecordsManager) -> Self {
        Self { manager }
    }
}
