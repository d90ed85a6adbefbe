//! API request and response types

use crate::config::WorkflowSettings;
use crate::conversation::{ConversationThread, MessageContent};
use crate::session::SessionStatus;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request to submit a new turn
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// Generated when absent
    #[serde(default)]
    pub thread_id: Option<String>,
    pub content: MessageContent,
    /// Per-turn override of the configured workflow settings
    #[serde(default)]
    pub settings: Option<WorkflowSettings>,
}

/// Response for a submission
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub thread_id: String,
}

/// A thread snapshot with its session status
#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub thread: Arc<ConversationThread>,
    pub status: SessionStatus,
}

/// Response with all threads in creation order
#[derive(Debug, Serialize)]
pub struct ThreadListResponse {
    pub threads: Vec<ThreadResponse>,
}

/// Response for cancel action
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub ok: bool,
    pub status: SessionStatus,
}

/// Selection for the graph view
#[derive(Debug, Default, Deserialize)]
pub struct ViewQuery {
    pub agent: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
