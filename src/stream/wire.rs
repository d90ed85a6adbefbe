//! Wire format of a `data:` payload

use crate::conversation::{EventKind, MessageContent, StreamEvent};
use serde::Deserialize;
use serde_json::Value;

/// JSON payload as emitted by the orchestrator
#[derive(Debug, Deserialize)]
struct WireEvent {
    #[serde(default)]
    thread_id: Option<String>,
    agent: String,
    id: String,
    #[serde(default)]
    #[allow(dead_code)] // Always "assistant" today
    role: Option<String>,
    /// Missing and `null` both decode as `Value::Null`
    #[serde(default)]
    content: Value,
    #[serde(default)]
    finish_reason: Option<String>,
    #[serde(default)]
    tool_calls: Option<Value>,
    #[serde(default)]
    tool_call_chunks: Option<Value>,
    #[serde(default)]
    tool_call_id: Option<String>,
}

impl WireEvent {
    fn into_event(self, kind: EventKind) -> StreamEvent {
        StreamEvent {
            kind,
            thread_id: self.thread_id,
            agent: self.agent,
            item_id: self.id,
            content: MessageContent::from_value(self.content),
            finish_reason: self.finish_reason,
            tool_calls: self.tool_calls,
            tool_call_chunks: self.tool_call_chunks,
            tool_call_id: self.tool_call_id,
        }
    }
}

/// Decode one `data:` payload into a stream event
pub(super) fn decode(payload: &str, kind: EventKind) -> Result<StreamEvent, serde_json::Error> {
    serde_json::from_str::<WireEvent>(payload).map(|wire| wire.into_event(kind))
}
