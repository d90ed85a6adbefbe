//! HTTP API for the workflow chat service
//!
//! Inbound surface for the UI: submit turns, cancel them, read thread
//! snapshots and graph projections, and follow a thread over SSE.

mod handlers;
mod sse;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::session::SessionManager;
use crate::store::ThreadStore;
use crate::topology::GraphTopology;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub topology: Arc<GraphTopology>,
}

impl AppState {
    pub fn new(sessions: Arc<SessionManager>, topology: GraphTopology) -> Self {
        Self {
            sessions,
            topology: Arc::new(topology),
        }
    }

    pub fn store(&self) -> &Arc<ThreadStore> {
        self.sessions.store()
    }
}
