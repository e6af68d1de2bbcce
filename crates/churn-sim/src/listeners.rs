//! Listener registry and event dispatch

use churn_core::{IntentEvent, IntentListener, ListenerId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Registered intent listeners
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<HashMap<ListenerId, Arc<dyn IntentListener>>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn add(&self, listener: Arc<dyn IntentListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.write().insert(id, listener);
        debug!("Registered {}", id);
        id
    }

    /// Remove a listener, returns false if unknown
    pub fn remove(&self, id: ListenerId) -> bool {
        let removed = self.listeners.write().remove(&id).is_some();
        if removed {
            debug!("Removed {}", id);
        }
        removed
    }

    /// Deliver an event to every registered listener.
    ///
    /// Listeners are called outside the lock so they may deregister
    /// themselves; a listener removed mid-dispatch can still see this event.
    pub fn dispatch(&self, event: &IntentEvent) {
        let snapshot: Vec<Arc<dyn IntentListener>> =
            self.listeners.read().values().cloned().collect();
        for listener in snapshot {
            listener.event(event);
        }
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }
}
