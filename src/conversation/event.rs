//! Events delivered by the orchestrator stream

use super::thread::MessageContent;
use serde_json::Value;

/// Wire-level kind of a stream record, taken from the SSE `event:` field
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EventKind {
    /// Raw message tokens
    #[default]
    MessageChunk,
    /// Complete tool call requests from an agent
    ToolCalls,
    /// Partial tool call arguments
    ToolCallChunks,
    /// Result returned by a tool
    ToolCallResult,
    Unknown(String),
}

impl EventKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "message_chunk" => EventKind::MessageChunk,
            "tool_calls" => EventKind::ToolCalls,
            "tool_call_chunks" => EventKind::ToolCallChunks,
            "tool_call_result" => EventKind::ToolCallResult,
            other => EventKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::MessageChunk => "message_chunk",
            EventKind::ToolCalls => "tool_calls",
            EventKind::ToolCallChunks => "tool_call_chunks",
            EventKind::ToolCallResult => "tool_call_result",
            EventKind::Unknown(name) => name,
        }
    }
}

/// One parsed stream record. Consumed once by the reducer, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamEvent {
    pub kind: EventKind,
    pub thread_id: Option<String>,
    pub agent: String,
    pub item_id: String,
    pub content: Option<MessageContent>,
    pub finish_reason: Option<String>,
    pub tool_calls: Option<Value>,
    pub tool_call_chunks: Option<Value>,
    pub tool_call_id: Option<String>,
}

impl StreamEvent {
    /// The fragment this event contributes to its item, if any.
    ///
    /// Only wire `content` counts. Tool call metadata rides along on the event
    /// and never touches item content.
    pub fn fragment(&self) -> Option<MessageContent> {
        self.content.as_ref().filter(|c| !c.is_empty()).cloned()
    }

    /// Whether the event carries any tool call metadata
    pub fn has_tool_metadata(&self) -> bool {
        self.tool_calls.is_some() || self.tool_call_chunks.is_some() || self.tool_call_id.is_some()
    }
}

// Builders for hand-written events
#[cfg(test)]
impl StreamEvent {
    pub fn new(agent: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            kind: EventKind::default(),
            thread_id: None,
            agent: agent.into(),
            item_id: item_id.into(),
            content: None,
            finish_reason: None,
            tool_calls: None,
            tool_call_chunks: None,
            tool_call_id: None,
        }
    }

    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_content(MessageContent::text(text))
    }

    #[must_use]
    pub fn with_content(mut self, content: MessageContent) -> Self {
        self.content = Some(content);
        self
    }

    #[must_use]
    pub fn with_finish_reason(mut self, reason: impl Into<String>) -> Self {
        self.finish_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: EventKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_tool_calls(mut self, calls: Value) -> Self {
        self.tool_calls = Some(calls);
        self
    }
}
