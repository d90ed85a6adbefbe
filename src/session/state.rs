//! Pure session lifecycle transitions
//!
//! `Idle -> Streaming -> (Completed | Cancelled | Failed)`

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of a thread's stream session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionStatus {
    /// No request has been made for this thread
    #[default]
    Idle,

    /// Request in flight, events are being applied
    Streaming,

    /// Terminal event observed or transport closed cleanly
    Completed,

    /// User cancelled; accumulated content is kept
    Cancelled,

    /// Transport failed; accumulated content is kept and the user may resubmit
    Failed { message: String },
}

impl SessionStatus {
    pub fn is_streaming(&self) -> bool {
        matches!(self, SessionStatus::Streaming)
    }

    /// Whether the session has reached an end state
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            SessionStatus::Completed | SessionStatus::Cancelled | SessionStatus::Failed { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Streaming => "streaming",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Failed { .. } => "failed",
        }
    }
}

/// Inputs that drive the session lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSignal {
    /// User submitted a turn
    Submit,
    /// Terminal event observed on the stream
    Terminal,
    /// Transport ended without error
    TransportClosed,
    /// Transport failed
    TransportError { message: String },
    /// User asked to stop
    Cancel,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Thread already has a streaming session")]
    AlreadyStreaming,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function.
///
/// Cancelling a finished session returns it unchanged, as do stream signals
/// that arrive after the session finished.
pub fn transition(
    status: &SessionStatus,
    signal: SessionSignal,
) -> Result<SessionStatus, TransitionError> {
    match (status, signal) {
        // A new turn may start from idle or after any end state
        (SessionStatus::Streaming, SessionSignal::Submit) => Err(TransitionError::AlreadyStreaming),
        (_, SessionSignal::Submit) => Ok(SessionStatus::Streaming),

        (SessionStatus::Streaming, SessionSignal::Terminal | SessionSignal::TransportClosed) => {
            Ok(SessionStatus::Completed)
        }
        (SessionStatus::Streaming, SessionSignal::Cancel) => Ok(SessionStatus::Cancelled),
        (SessionStatus::Streaming, SessionSignal::TransportError { message }) => {
            Ok(SessionStatus::Failed { message })
        }

        // Idempotent cancel, late stream signals
        (SessionStatus::Idle, SessionSignal::Cancel) => Ok(SessionStatus::Idle),
        (finished, _) if finished.is_finished() => Ok(finished.clone()),

        (status, signal) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {status:?} with signal {signal:?}"
        ))),
    }
}
