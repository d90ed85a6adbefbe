//! Pure reducer folding one stream event into a conversation thread

use super::event::StreamEvent;
use super::thread::{AgentMessageGroup, ConversationThread, MessageContent, MessageItem};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_TERMINAL_AGENT: &str = "finalize_answer";
pub const DEFAULT_STOP_REASON: &str = "stop";

/// Agent/finish-reason pair that marks the end of a workflow run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalCondition {
    pub agent: String,
    pub finish_reason: String,
}

impl TerminalCondition {
    pub fn new(agent: impl Into<String>, finish_reason: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            finish_reason: finish_reason.into(),
        }
    }

    pub fn matches(&self, event: &StreamEvent) -> bool {
        event.agent == self.agent && event.finish_reason.as_deref() == Some(self.finish_reason.as_str())
    }
}

impl Default for TerminalCondition {
    fn default() -> Self {
        Self::new(DEFAULT_TERMINAL_AGENT, DEFAULT_STOP_REASON)
    }
}

/// Pure reducer.
///
/// Given the same thread and event it always produces the same thread, and it
/// never fails. The input thread is left untouched; the returned value shares
/// every group and item the event did not modify.
pub fn reduce(
    thread: &ConversationThread,
    event: &StreamEvent,
    terminal: &TerminalCondition,
) -> ConversationThread {
    let mut next = thread.clone();

    let group_index = next
        .assistant_groups
        .iter()
        .position(|group| group.agent == event.agent)
        .unwrap_or_else(|| {
            next.assistant_groups
                .push(Arc::new(AgentMessageGroup::new(event.agent.clone())));
            next.assistant_groups.len() - 1
        });

    if let Some(fragment) = event.fragment() {
        let group = Arc::make_mut(&mut next.assistant_groups[group_index]);
        match group.items.iter().position(|item| item.id == event.item_id) {
            Some(item_index) => {
                let item = Arc::make_mut(&mut group.items[item_index]);
                merge_fragment(&mut item.content, fragment);
            }
            None => group
                .items
                .push(Arc::new(MessageItem::new(event.item_id.clone(), fragment))),
        }
    }

    next.current_agent = if terminal.matches(event) {
        String::new()
    } else {
        event.agent.clone()
    };

    next
}

/// Text appends to text; any structured side replaces wholesale.
fn merge_fragment(existing: &mut MessageContent, fragment: MessageContent) {
    match (existing, fragment) {
        (MessageContent::Text(text), MessageContent::Text(more)) => text.push_str(&more),
        (slot, replacement) => *slot = replacement,
    }
}
