//! Conversation threads and the reducer that folds stream events into them
//!
//! Implements the Elm Architecture pattern: `reduce` is a pure function from
//! (thread, event) to a new thread value.

pub mod event;
pub mod reduce;
pub mod thread;

#[cfg(test)]
mod proptests;

#[allow(unused_imports)] // Public API re-exports
pub use event::{EventKind, StreamEvent};
pub use reduce::{reduce, TerminalCondition};
pub use thread::{ConversationThread, MessageContent, MessageItem};
