//! Stream controller: drives one orchestrator request for one thread

use super::publisher::StatusPublisher;
use super::state::{transition, SessionSignal, SessionStatus};
use super::transport::{ChatStreamRequest, Transport};
use crate::conversation::{reduce, ConversationThread, StreamEvent, TerminalCondition};
use crate::store::ThreadStore;
use crate::stream::EventParser;
use futures::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Owns the transport for one turn and applies parsed events to the store.
///
/// Events are reduced strictly in parse order. The cancellation token is
/// checked at every chunk read and before every event is applied.
pub struct StreamController {
    thread_id: String,
    request: ChatStreamRequest,
    store: Arc<ThreadStore>,
    transport: Arc<dyn Transport>,
    terminal: TerminalCondition,
    cancel: CancellationToken,
    status: StatusPublisher,
}

impl StreamController {
    pub fn new(
        request: ChatStreamRequest,
        store: Arc<ThreadStore>,
        transport: Arc<dyn Transport>,
        terminal: TerminalCondition,
        cancel: CancellationToken,
        status: StatusPublisher,
    ) -> Self {
        Self {
            thread_id: request.thread_id.clone(),
            request,
            store,
            transport,
            terminal,
            cancel,
            status,
        }
    }

    /// Run to completion and return the final status
    pub async fn run(self) -> SessionStatus {
        tracing::info!(thread_id = %self.thread_id, "Starting stream session");

        let mut parser = EventParser::new();
        let signal = self.consume(&mut parser).await;
        let status = self.finish(signal);

        let items = self
            .store
            .get(&self.thread_id)
            .map_or(0, |thread| thread.item_count());
        tracing::info!(
            thread_id = %self.thread_id,
            status = status.name(),
            items,
            dropped_records = parser.dropped(),
            "Stream session finished"
        );
        status
    }

    async fn consume(&self, parser: &mut EventParser) -> SessionSignal {
        let opened = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return SessionSignal::Cancel,
            opened = self.transport.open(&self.request) => opened,
        };
        let mut chunks = match opened {
            Ok(chunks) => chunks,
            Err(e) => {
                tracing::error!(thread_id = %self.thread_id, error = %e, retryable = e.kind.is_retryable(), "Failed to open stream");
                return SessionSignal::TransportError { message: e.to_string() };
            }
        };

        loop {
            let next = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return SessionSignal::Cancel,
                next = chunks.next() => next,
            };

            match next {
                Some(Ok(bytes)) => {
                    for event in parser.push(&bytes) {
                        if self.cancel.is_cancelled() {
                            return SessionSignal::Cancel;
                        }
                        if self.apply(&event) {
                            return SessionSignal::Terminal;
                        }
                    }
                }
                Some(Err(e)) => {
                    tracing::error!(thread_id = %self.thread_id, error = %e, "Stream read failed");
                    return SessionSignal::TransportError { message: e.to_string() };
                }
                None => {
                    parser.finish();
                    return SessionSignal::TransportClosed;
                }
            }
        }
    }

    /// Fold one event into the thread. Returns true if it was terminal.
    fn apply(&self, event: &StreamEvent) -> bool {
        if let Some(upstream) = event.thread_id.as_deref() {
            if upstream != self.thread_id {
                tracing::debug!(thread_id = %self.thread_id, upstream = %upstream, "Event tagged with another thread id");
            }
        }
        if event.has_tool_metadata() {
            tracing::debug!(
                thread_id = %self.thread_id,
                kind = event.kind.as_str(),
                agent = %event.agent,
                item_id = %event.item_id,
                "Tool call metadata received"
            );
        }

        self.store
            .update(&self.thread_id, |thread| reduce(thread, event, &self.terminal));
        self.terminal.matches(event)
    }

    fn finish(&self, signal: SessionSignal) -> SessionStatus {
        let current = self.status.current();
        let status = transition(&current, signal).unwrap_or_else(|e| {
            tracing::warn!(thread_id = %self.thread_id, error = %e, "Unexpected session transition");
            SessionStatus::Failed {
                message: e.to_string(),
            }
        });

        // Nothing executes once the session ends; content stays as it is
        let needs_clear = self
            .store
            .get(&self.thread_id)
            .is_some_and(|thread| !thread.is_idle());
        if needs_clear {
            self.store
                .update(&self.thread_id, ConversationThread::without_current_agent);
        }

        self.status.publish(status.clone());
        status
    }
}
