//! Per-thread session status, shared by every session the thread ever has

use super::state::SessionStatus;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// One status change, as seen by manager-wide subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub thread_id: String,
    pub status: SessionStatus,
}

/// Holds a thread's current status and announces each change.
///
/// The manager creates one per thread id and hands clones to each controller,
/// so receivers keep working across resubmissions.
#[derive(Clone)]
pub struct StatusPublisher {
    thread_id: String,
    current: Arc<watch::Sender<SessionStatus>>,
    updates: broadcast::Sender<StatusUpdate>,
}

impl StatusPublisher {
    pub fn new(thread_id: impl Into<String>, updates: broadcast::Sender<StatusUpdate>) -> Self {
        let (current, _) = watch::channel(SessionStatus::Idle);
        Self {
            thread_id: thread_id.into(),
            current: Arc::new(current),
            updates,
        }
    }

    pub fn current(&self) -> SessionStatus {
        self.current.borrow().clone()
    }

    pub fn publish(&self, status: SessionStatus) {
        self.current.send_replace(status.clone());
        // No subscribers is fine
        let _ = self.updates.send(StatusUpdate {
            thread_id: self.thread_id.clone(),
            status,
        });
    }

    pub fn watch(&self) -> watch::Receiver<SessionStatus> {
        self.current.subscribe()
    }
}
