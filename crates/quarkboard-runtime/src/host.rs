//! The runtime's implementation of the plugin-facing [`Host`].

use quarkboard_core::{EventBus, Host};
use serde_json::Value;

use crate::options::Options;

/// Shared state every plugin is constructed against.
///
/// Held as `Arc<HostContext>` by the runtime and as `Arc<dyn Host>` by each
/// plugin. It does not own the plugins, so plugins keeping it alive cannot
/// form a cycle with the registry.
#[derive(Debug, Default)]
pub struct HostContext {
    events: EventBus,
    options: Options,
}

impl HostContext {
    pub fn new(options: Options) -> Self {
        Self {
            events: EventBus::new(),
            options,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }
}

impl Host for HostContext {
    fn events(&self) -> &EventBus {
        &self.events
    }

    fn opt(&self, option: &str) -> Option<Value> {
        self.options.get(option).cloned()
    }
}
