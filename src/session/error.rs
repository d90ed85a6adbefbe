//! Session error types

use thiserror::Error;

/// Transport error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::ServerError, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Rejected, message)
    }

    /// Classify an HTTP status returned by the orchestrator
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = format!("Orchestrator returned {status}: {body}");
        if status >= 500 {
            Self::server_error(message)
        } else {
            Self::rejected(message)
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else if let Some(status) = error.status() {
            Self::from_status(status.as_u16(), &error.to_string())
        } else {
            Self::network(error.to_string())
        }
    }
}

/// Error classification for deciding whether a resubmission may help
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused or reset
    Network,
    /// Connect or read timeout
    Timeout,
    /// Orchestrator error (5xx)
    ServerError,
    /// Request refused (4xx)
    Rejected,
}

impl TransportErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::ServerError)
    }
}

/// Errors returned by `SessionManager::submit`
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Thread {0} already has a streaming session")]
    AlreadyStreaming(String),
    #[error("Thread id must not be empty")]
    EmptyThreadId,
}

/// Errors returned by session lookups
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No session for thread {0}")]
    NotFound(String),
}
