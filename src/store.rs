//! Process-wide registry of conversation threads
//!
//! Created once at startup and shared as `Arc<ThreadStore>`. Every content
//! change goes through [`ThreadStore::update`], and each new value is
//! published to subscribers.

use crate::conversation::ConversationThread;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

const UPDATE_CHANNEL_CAPACITY: usize = 256;

#[derive(Default)]
struct StoreInner {
    /// Thread ids in insertion order
    order: Vec<String>,
    threads: HashMap<String, Arc<ConversationThread>>,
}

/// Thread registry keyed by thread id
pub struct ThreadStore {
    inner: RwLock<StoreInner>,
    updates: broadcast::Sender<Arc<ConversationThread>>,
}

impl ThreadStore {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            inner: RwLock::new(StoreInner::default()),
            updates,
        }
    }

    /// Insert a thread. Re-creating an existing id replaces its value but
    /// keeps its original position.
    pub fn create(&self, id: &str, initial: ConversationThread) -> Arc<ConversationThread> {
        let thread = Arc::new(initial);
        {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            if inner
                .threads
                .insert(id.to_string(), Arc::clone(&thread))
                .is_none()
            {
                inner.order.push(id.to_string());
            }
        }
        self.publish(&thread);
        thread
    }

    pub fn get(&self, id: &str) -> Option<Arc<ConversationThread>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.threads.get(id).cloned()
    }

    /// Replace a thread with `f(thread)`. A missing id is a no-op: a thread
    /// may still receive trailing events after it was discarded.
    pub fn update<F>(&self, id: &str, f: F) -> Option<Arc<ConversationThread>>
    where
        F: FnOnce(&ConversationThread) -> ConversationThread,
    {
        let thread = {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            let Some(slot) = inner.threads.get_mut(id) else {
                tracing::debug!(thread_id = %id, "Ignoring update for unknown thread");
                return None;
            };
            let next = Arc::new(f(slot.as_ref()));
            *slot = Arc::clone(&next);
            next
        };
        self.publish(&thread);
        Some(thread)
    }

    /// All threads in insertion order
    pub fn all(&self) -> Vec<Arc<ConversationThread>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .order
            .iter()
            .filter_map(|id| inner.threads.get(id).cloned())
            .collect()
    }

    /// Receive every thread value produced by `create` or `update`.
    ///
    /// Slow receivers may lag and skip values; `get` always returns the latest.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ConversationThread>> {
        self.updates.subscribe()
    }

    fn publish(&self, thread: &Arc<ConversationThread>) {
        // No subscribers is fine
        let _ = self.updates.send(Arc::clone(thread));
    }
}

impl Default for ThreadStore {
    fn default() -> Self {
        Self::new()
    }
}
