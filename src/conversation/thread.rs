//! Conversation thread types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

// ============================================================================
// Message Content
// ============================================================================

/// Content of a message item: streamed text or an opaque structured payload.
///
/// Serialized untagged, so a JSON string is `Text` and anything else is
/// `Structured`. This matches the orchestrator wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Structured(Value),
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        MessageContent::Text(text.into())
    }

    /// Convert a raw wire value. `null`, `""` and `[]` carry no content.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(text) if text.is_empty() => None,
            Value::String(text) => Some(MessageContent::Text(text)),
            Value::Array(ref parts) if parts.is_empty() => None,
            other => Some(MessageContent::Structured(other)),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            MessageContent::Text(text) => text.is_empty(),
            MessageContent::Structured(value) => value.is_null(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text),
            MessageContent::Structured(_) => None,
        }
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::text(text)
    }
}

// ============================================================================
// Items and Groups
// ============================================================================

/// A unit of content attributable to one agent, built up from fragments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageItem {
    pub id: String,
    pub content: MessageContent,
}

impl MessageItem {
    pub fn new(id: impl Into<String>, content: MessageContent) -> Self {
        Self {
            id: id.into(),
            content,
        }
    }
}

/// All items produced by one agent within a thread, in first-seen order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessageGroup {
    pub agent: String,
    pub items: Vec<Arc<MessageItem>>,
}

impl AgentMessageGroup {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            items: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn item(&self, id: &str) -> Option<&MessageItem> {
        self.items.iter().find(|item| item.id == id).map(AsRef::as_ref)
    }

    /// Concatenated text of every text item, in item order
    pub fn text(&self) -> String {
        self.items
            .iter()
            .filter_map(|item| item.content.as_text())
            .collect()
    }
}

// ============================================================================
// Conversation Thread
// ============================================================================

/// One user turn and the full agent response tree for it.
///
/// Groups and items sit behind `Arc` so successive thread values produced by
/// the reducer share every subtree the event did not touch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationThread {
    pub id: String,
    /// Most recently active agent; empty when nothing is executing
    pub current_agent: String,
    pub user_message: MessageContent,
    pub assistant_groups: Vec<Arc<AgentMessageGroup>>,
    pub created_at: DateTime<Utc>,
}

impl ConversationThread {
    pub fn new(id: impl Into<String>, user_message: MessageContent) -> Self {
        Self {
            id: id.into(),
            current_agent: String::new(),
            user_message,
            assistant_groups: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn group(&self, agent: &str) -> Option<&AgentMessageGroup> {
        self.assistant_groups
            .iter()
            .find(|group| group.agent == agent)
            .map(AsRef::as_ref)
    }

    pub fn is_idle(&self) -> bool {
        self.current_agent.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.assistant_groups.iter().map(|g| g.items.len()).sum()
    }

    /// Copy of this thread with no executing agent. Content is untouched.
    pub fn without_current_agent(&self) -> Self {
        Self {
            current_agent: String::new(),
            ..self.clone()
        }
    }
}
