//! Host-side named notifications.
//!
//! Listeners are invoked synchronously on the emitting thread. The registry
//! lock is released before any listener runs, so a listener may add or remove
//! listeners or emit further notifications.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use smallvec::SmallVec;

/// Posted once the worker reports that the bundle has been evaluated.
pub const JAVASCRIPT_DID_LOAD: &str = "RCTJavaScriptDidLoadNotification";

pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<String, SmallVec<[(ListenerId, Listener); 4]>>,
}

#[derive(Clone, Default)]
pub struct NotificationCenter {
    inner: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.inner.lock();
        f.debug_struct("NotificationCenter")
            .field("events", &registry.listeners.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, event: &str, listener: Listener) -> ListenerId {
        let mut registry = self.inner.lock();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry
            .listeners
            .entry(event.to_string())
            .or_default()
            .push((id, listener));
        id
    }

    /// Returns `false` when no such listener was registered.
    pub fn remove_listener(&self, event: &str, id: ListenerId) -> bool {
        let mut registry = self.inner.lock();
        let Some(entries) = registry.listeners.get_mut(event) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(existing, _)| *existing != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            registry.listeners.remove(event);
        }
        removed
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner
            .lock()
            .listeners
            .get(event)
            .map_or(0, |entries| entries.len())
    }

    /// Notifies every listener of `event`; returns how many ran.
    pub fn emit_event(&self, event: &str, body: &Value) -> usize {
        let listeners: SmallVec<[Listener; 4]> = self
            .inner
            .lock()
            .listeners
            .get(event)
            .map(|entries| entries.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();
        for listener in &listeners {
            listener(body);
        }
        listeners.len()
    }
}
