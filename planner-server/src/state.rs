//! Shared application state for the planner server.

use std::sync::Arc;

use planner::agents::planner::RemotePlanner;
use planner::io::store::DocumentStore;

/// Shared state accessible from all request handlers.
///
/// Both handles are created once at startup and live for the whole process.
#[derive(Clone)]
pub struct AppState {
    /// LLM-backed plan generator (possibly without a configured client).
    pub planner: Arc<RemotePlanner>,
    /// Goal and task persistence.
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(planner: RemotePlanner, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            planner: Arc::new(planner),
            store,
        }
    }
}
