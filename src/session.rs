//! Stream sessions for conversation turns
//!
//! The `SessionManager` is the caller-facing entry point: it creates the
//! thread for a new turn, opens the orchestrator stream, and hands the stream
//! to a `StreamController` task. Each thread has at most one streaming
//! session at a time.

mod controller;
mod error;
mod publisher;
pub mod state;
mod transport;

#[cfg(test)]
pub mod testing;

pub use controller::StreamController;
#[allow(unused_imports)] // Public API re-exports
pub use error::{SessionError, SubmitError, TransportError, TransportErrorKind};
pub use publisher::StatusUpdate;
pub use state::{transition, SessionSignal, SessionStatus, TransitionError};
#[allow(unused_imports)] // Public API re-exports
pub use transport::{ByteStream, ChatMessage, ChatStreamRequest, HttpTransport, Transport};

use crate::config::WorkflowSettings;
use crate::conversation::{ConversationThread, MessageContent, TerminalCondition};
use crate::store::ThreadStore;
use publisher::StatusPublisher;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, watch, RwLock};
use tokio_util::sync::CancellationToken;

/// Capacity of the manager-wide status update channel
const STATUS_CHANNEL_CAPACITY: usize = 256;

/// A thread's most recent session, plus the status it shares with every
/// session before and after it
struct SessionHandle {
    cancel: CancellationToken,
    status: StatusPublisher,
}

/// Manager for all stream sessions
pub struct SessionManager {
    store: Arc<ThreadStore>,
    transport: Arc<dyn Transport>,
    settings: WorkflowSettings,
    terminal: TerminalCondition,
    sessions: RwLock<HashMap<String, SessionHandle>>,
    status_updates: broadcast::Sender<StatusUpdate>,
}

impl SessionManager {
    pub fn new(
        store: Arc<ThreadStore>,
        transport: Arc<dyn Transport>,
        settings: WorkflowSettings,
        terminal: TerminalCondition,
    ) -> Self {
        let (status_updates, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        Self {
            store,
            transport,
            settings,
            terminal,
            sessions: RwLock::new(HashMap::new()),
            status_updates,
        }
    }

    pub fn store(&self) -> &Arc<ThreadStore> {
        &self.store
    }

    /// Start a new turn on `thread_id`.
    ///
    /// The thread exists in the store before any network activity. Rejected if
    /// the thread already has a streaming session.
    pub async fn submit(
        &self,
        thread_id: &str,
        content: MessageContent,
        settings: Option<WorkflowSettings>,
    ) -> Result<(), SubmitError> {
        if thread_id.trim().is_empty() {
            return Err(SubmitError::EmptyThreadId);
        }

        let mut sessions = self.sessions.write().await;
        let publisher = sessions
            .get(thread_id)
            .map(|handle| handle.status.clone())
            .unwrap_or_else(|| StatusPublisher::new(thread_id, self.status_updates.clone()));
        let status = transition(&publisher.current(), SessionSignal::Submit).map_err(|e| match e {
            TransitionError::AlreadyStreaming | TransitionError::InvalidTransition(_) => {
                SubmitError::AlreadyStreaming(thread_id.to_string())
            }
        })?;

        let mut messages = self.history(thread_id);
        messages.push(ChatMessage::user(content.clone()));
        self.store
            .create(thread_id, ConversationThread::new(thread_id, content));

        let request = ChatStreamRequest {
            messages,
            thread_id: thread_id.to_string(),
            settings: settings.unwrap_or_else(|| self.settings.clone()),
        };

        let cancel = CancellationToken::new();
        publisher.publish(status);
        sessions.insert(
            thread_id.to_string(),
            SessionHandle {
                cancel: cancel.clone(),
                status: publisher.clone(),
            },
        );
        drop(sessions);

        let controller = StreamController::new(
            request,
            Arc::clone(&self.store),
            Arc::clone(&self.transport),
            self.terminal.clone(),
            cancel,
            publisher,
        );
        tokio::spawn(controller.run());

        tracing::info!(thread_id = %thread_id, "Turn submitted");
        Ok(())
    }

    /// Request cancellation and return the status the session settles in.
    ///
    /// Cancelling a finished session is a no-op that returns its end status.
    pub async fn cancel(&self, thread_id: &str) -> Result<SessionStatus, SessionError> {
        let (cancel, mut status_rx) = {
            let sessions = self.sessions.read().await;
            let handle = sessions
                .get(thread_id)
                .ok_or_else(|| SessionError::NotFound(thread_id.to_string()))?;
            (handle.cancel.clone(), handle.status.watch())
        };

        if status_rx.borrow().is_streaming() {
            tracing::info!(thread_id = %thread_id, "Cancelling stream session");
        }
        cancel.cancel();

        // The controller observes the token at its next await point
        let settled = status_rx
            .wait_for(|status| !status.is_streaming())
            .await
            .map(|status| status.clone())
            .unwrap_or_else(|_| status_rx.borrow().clone());
        Ok(settled)
    }

    /// Cancel every streaming session (used at shutdown)
    pub async fn cancel_all(&self) {
        let sessions = self.sessions.read().await;
        for handle in sessions.values() {
            handle.cancel.cancel();
        }
    }

    /// Current status; `Idle` for threads that never had a session
    pub async fn status(&self, thread_id: &str) -> SessionStatus {
        self.sessions
            .read()
            .await
            .get(thread_id)
            .map(|handle| handle.status.current())
            .unwrap_or_default()
    }

    /// Status changes of every thread, across all of its sessions
    pub fn subscribe_status(&self) -> broadcast::Receiver<StatusUpdate> {
        self.status_updates.subscribe()
    }

    /// Wait until the thread's session leaves `Streaming`
    pub async fn wait_for_completion(&self, thread_id: &str) -> Option<SessionStatus> {
        let mut rx = self.status_receiver(thread_id).await?;
        let status = rx.wait_for(|status| !status.is_streaming()).await.ok()?;
        Some(status.clone())
    }

    async fn status_receiver(&self, thread_id: &str) -> Option<watch::Receiver<SessionStatus>> {
        self.sessions
            .read()
            .await
            .get(thread_id)
            .map(|handle| handle.status.watch())
    }

    /// Earlier turns as chat history: each user message, followed by the
    /// terminal agent's text when it produced any
    fn history(&self, exclude: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::new();
        for thread in self.store.all() {
            if thread.id == exclude {
                continue;
            }
            messages.push(ChatMessage::user(thread.user_message.clone()));
            if let Some(answer) = thread
                .group(&self.terminal.agent)
                .map(|group| group.text())
                .filter(|text| !text.is_empty())
            {
                messages.push(ChatMessage::assistant(answer));
            }
        }
        messages
    }
}
