//! Server-Sent Events support
//!
//! A thread stream starts with an `init` snapshot, then carries one `thread`
//! event per store update of that thread and one `status` event per session
//! status change, across every session the thread goes through.

use crate::conversation::ConversationThread;
use crate::session::{SessionStatus, StatusUpdate};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Events pushed to a thread subscriber
#[derive(Debug, Clone)]
pub enum ThreadEvent {
    Init {
        thread: Arc<ConversationThread>,
        status: SessionStatus,
    },
    Thread {
        thread: Arc<ConversationThread>,
    },
    Status {
        status: SessionStatus,
    },
}

/// Build the SSE response for one thread
pub fn sse_stream(
    init_event: ThreadEvent,
    thread_id: String,
    updates: broadcast::Receiver<Arc<ConversationThread>>,
    status_updates: broadcast::Receiver<StatusUpdate>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = stream::once(async move { init_event });

    let status_thread_id = thread_id.clone();
    let threads = BroadcastStream::new(updates).filter_map(move |result| {
        let event = match result {
            Ok(thread) if thread.id == thread_id => Some(ThreadEvent::Thread { thread }),
            Ok(_) => None,
            Err(e) => {
                // Lagged: the next update carries the full snapshot anyway
                tracing::debug!(thread_id = %thread_id, error = %e, "SSE subscriber lagged");
                None
            }
        };
        async move { event }
    });

    let statuses = BroadcastStream::new(status_updates).filter_map(move |result| {
        let event = match result {
            Ok(update) if update.thread_id == status_thread_id => Some(ThreadEvent::Status {
                status: update.status,
            }),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(thread_id = %status_thread_id, error = %e, "SSE subscriber missed status updates");
                None
            }
        };
        async move { event }
    });

    let combined = init
        .chain(stream::select(threads, statuses))
        .map(|event| Ok(thread_event_to_axum(event)));

    Sse::new(combined).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn thread_event_to_axum(event: ThreadEvent) -> Event {
    let (event_type, data) = match event {
        ThreadEvent::Init { thread, status } => (
            "init",
            json!({
                "type": "init",
                "thread": thread,
                "status": status
            }),
        ),
        ThreadEvent::Thread { thread } => (
            "thread",
            json!({
                "type": "thread",
                "thread": thread
            }),
        ),
        ThreadEvent::Status { status } => (
            "status",
            json!({
                "type": "status",
                "status": status
            }),
        ),
    };

    Event::default().event(event_type).data(data.to_string())
}
