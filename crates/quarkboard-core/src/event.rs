//! Synchronous event bus shared by the host and its plugins.
//!
//! The bus is owned by the host. Plugins never get a bus of their own; their
//! `emit`/`on`/`once` calls forward here.
//!
//! # Semantics
//!
//! - Listeners for an event fire in registration order.
//! - [`EventBus::emit`] returns only after every listener for that call ran.
//! - A `once` listener is removed before it is invoked, so an emit from inside
//!   the listener does not re-trigger it.
//! - The internal lock is never held while listeners run; listeners may
//!   register, remove, or emit re-entrantly.
//!
//! # Example
//!
//! ```rust,ignore
//! let bus = EventBus::new();
//! bus.on("render", |args| println!("render {args:?}"));
//! bus.emit("render", &[json!(1), json!(2)]);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::trace;

/// A listener callback. Receives the arguments passed to `emit`.
pub type Listener = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Handle identifying one listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct ListenerEntry {
    id: ListenerId,
    once: bool,
    callback: Listener,
}

/// Host-owned publish/subscribe bus with synchronous, ordered delivery.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<HashMap<String, Vec<ListenerEntry>>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `listener` to the listeners of `event`.
    pub fn on<F>(&self, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.add_listener(event, Arc::new(listener), false)
    }

    /// Appends a listener that is removed after its first invocation.
    pub fn once<F>(&self, event: &str, listener: F) -> ListenerId
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.add_listener(event, Arc::new(listener), true)
    }

    /// Appends an already shared listener.
    pub fn add_listener(&self, event: &str, callback: Listener, once: bool) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .entry(event.to_string())
            .or_default()
            .push(ListenerEntry { id, once, callback });
        trace!(event, listener = id.0, once, "Listener registered");
        id
    }

    /// Removes one registration. Returns `false` if it was already gone.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(entries) = listeners.get_mut(event) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            listeners.remove(event);
        }
        removed
    }

    /// Removes every listener of `event`, or of all events when `None`.
    pub fn remove_all_listeners(&self, event: Option<&str>) {
        let mut listeners = self.listeners.lock();
        match event {
            Some(event) => {
                listeners.remove(event);
            }
            None => listeners.clear(),
        }
    }

    /// Calls every listener of `event` in registration order.
    ///
    /// Returns `true` if the event had listeners.
    pub fn emit(&self, event: &str, args: &[Value]) -> bool {
        let snapshot: Vec<Listener> = {
            let mut listeners = self.listeners.lock();
            let Some(entries) = listeners.get_mut(event) else {
                trace!(event, "Emitted event without listeners");
                return false;
            };
            let snapshot = entries
                .iter()
                .map(|entry| Arc::clone(&entry.callback))
                .collect();
            entries.retain(|entry| !entry.once);
            if entries.is_empty() {
                listeners.remove(event);
            }
            snapshot
        };

        trace!(event, listeners = snapshot.len(), "Emitting event");
        for listener in &snapshot {
            listener(args);
        }
        !snapshot.is_empty()
    }

    /// Returns the number of listeners registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.lock().get(event).map_or(0, Vec::len)
    }

    /// Returns the names of events that currently have listeners, sorted.
    pub fn event_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.listeners.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("events", &self.event_names())
            .finish()
    }
}
