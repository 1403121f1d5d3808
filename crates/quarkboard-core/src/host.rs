//! The host boundary as seen from a plugin.

use serde_json::Value;

use crate::event::{EventBus, Listener, ListenerId};

/// The host application a plugin is constructed against.
///
/// The host owns the event bus and outlives every plugin it constructs.
/// Plugins hold it as `Arc<dyn Host>` and never create or destroy it.
pub trait Host: Send + Sync {
    /// The shared event bus.
    fn events(&self) -> &EventBus;

    /// Returns the value of a command-line option, if it was given.
    fn opt(&self, _option: &str) -> Option<Value> {
        None
    }

    /// Returns whether a command-line option was given.
    fn has_opt(&self, option: &str) -> bool {
        self.opt(option).is_some()
    }

    /// Forwards to [`EventBus::emit`].
    fn emit(&self, event: &str, args: &[Value]) -> bool {
        self.events().emit(event, args)
    }

    /// Forwards to [`EventBus::add_listener`].
    fn on(&self, event: &str, listener: Listener) -> ListenerId {
        self.events().add_listener(event, listener, false)
    }

    /// Forwards to [`EventBus::add_listener`] with `once` set.
    fn once(&self, event: &str, listener: Listener) -> ListenerId {
        self.events().add_listener(event, listener, true)
    }

    /// Forwards to [`EventBus::off`].
    fn off(&self, event: &str, id: ListenerId) -> bool {
        self.events().off(event, id)
    }
}
