//! Plugin registry: the ordered set of plugins a host drives.
//!
//! Registration order is significant. Plugins are loaded and asked for
//! contributions in that order, and unloaded in reverse.

use std::sync::Arc;

use quarkboard_core::{
    Host, LifecycleState, PluginConfig, PluginDescriptor, PluginError, PluginInstance,
    PluginResult,
};
use tracing::{debug, info, warn};

/// Ordered collection of [`PluginInstance`]s keyed by plugin name.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: Vec<PluginInstance>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constructs a plugin and appends it to the registry.
    ///
    /// Names are unique; a second plugin with the same name is rejected
    /// before it is constructed.
    pub fn register(
        &mut self,
        descriptor: &PluginDescriptor,
        config: PluginConfig,
        app: Arc<dyn Host>,
    ) -> PluginResult<&mut PluginInstance> {
        if self.contains(config.name()) {
            warn!(plugin = %config.name(), "Plugin already registered");
            return Err(PluginError::DuplicatePlugin(config.name().to_string()));
        }

        let instance = PluginInstance::construct(descriptor, config, app)?;
        info!(plugin = %instance.name(), kind = %instance.kind(), "Registered plugin");

        let index = self.plugins.len();
        self.plugins.push(instance);
        Ok(&mut self.plugins[index])
    }

    /// Loads every `Initialized` plugin in registration order.
    ///
    /// A failing plugin is left `Failed` and does not stop the others.
    /// Returns the errors of the plugins that failed.
    pub fn load_all(&mut self) -> Vec<PluginError> {
        let mut failures = Vec::new();
        let mut loaded = 0usize;

        for instance in &mut self.plugins {
            if instance.state() != LifecycleState::Initialized {
                continue;
            }
            let span = tracing::debug_span!("plugin.load", plugin = %instance.name());
            let _enter = span.enter();
            match instance.load() {
                Ok(()) => loaded += 1,
                Err(e) => failures.push(e),
            }
        }

        info!(loaded, failed = failures.len(), "Plugins loaded");
        failures
    }

    /// Unloads every `Loaded` or `Failed` plugin in reverse registration
    /// order. Every plugin is attempted; hook errors are returned.
    pub fn unload_all(&mut self) -> Vec<PluginError> {
        let mut failures = Vec::new();

        for instance in self.plugins.iter_mut().rev() {
            if !matches!(
                instance.state(),
                LifecycleState::Loaded | LifecycleState::Failed
            ) {
                continue;
            }
            let span = tracing::debug_span!("plugin.unload", plugin = %instance.name());
            let _enter = span.enter();
            if let Err(e) = instance.unload() {
                failures.push(e);
            }
        }

        debug!(failed = failures.len(), "Plugins unloaded");
        failures
    }

    /// Removes a plugin, unloading it first when it is loaded or failed.
    ///
    /// The plugin is removed even when its `unload` hook fails; the hook
    /// error is returned in that case.
    pub fn remove(&mut self, name: &str) -> PluginResult<()> {
        let index = self
            .position(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;
        let mut instance = self.plugins.remove(index);

        let result = match instance.state() {
            LifecycleState::Loaded | LifecycleState::Failed => instance.unload(),
            _ => Ok(()),
        };
        info!(plugin = %name, "Removed plugin");
        result
    }

    pub fn get(&self, name: &str) -> Option<&PluginInstance> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PluginInstance> {
        self.plugins.iter_mut().find(|p| p.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn state(&self, name: &str) -> Option<LifecycleState> {
        self.get(name).map(PluginInstance::state)
    }

    /// Toggles a plugin's `enabled` flag.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> PluginResult<()> {
        let instance = self
            .get(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;
        instance.set_enabled(enabled);
        debug!(plugin = %name, enabled, "Plugin enabled flag changed");
        Ok(())
    }

    /// Plugin names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(PluginInstance::name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginInstance> {
        self.plugins.iter()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.plugins.iter().position(|p| p.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostContext;
    use crate::testing::{Tile, journal_of, tile_config};
    use quarkboard_core::Operation;
    use serde_json::json;

    fn host() -> Arc<HostContext> {
        Arc::new(HostContext::default())
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let host = host();
        let mut registry = PluginRegistry::new();
        let descriptor = PluginDescriptor::of::<Tile>();

        registry
            .register(&descriptor, tile_config("clock", json!({})), host.clone())
            .unwrap();
        let err = registry
            .register(&descriptor, tile_config("clock", json!({})), host)
            .unwrap_err();

        assert!(matches!(err, PluginError::DuplicatePlugin(name) if name == "clock"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.state("clock"), Some(LifecycleState::Initialized));
    }

    #[test]
    fn test_failing_plugin_does_not_stop_others() {
        let host = host();
        let mut registry = PluginRegistry::new();
        let descriptor = PluginDescriptor::of::<Tile>();
        for (name, settings) in [
            ("clock", json!({})),
            ("weather", json!({ "fail_load": true })),
            ("news", json!({})),
        ] {
            registry
                .register(&descriptor, tile_config(name, settings), host.clone())
                .unwrap();
        }

        let failures = registry.load_all();
        assert_eq!(failures.len(), 1);
        assert!(matches!(
            &failures[0],
            PluginError::Hook { plugin, stage: Operation::Load, .. } if plugin == "weather"
        ));
        assert_eq!(registry.state("clock"), Some(LifecycleState::Loaded));
        assert_eq!(registry.state("weather"), Some(LifecycleState::Failed));
        assert_eq!(registry.state("news"), Some(LifecycleState::Loaded));

        // Already loaded plugins are not loaded twice.
        assert!(registry.load_all().is_empty());
    }

    #[test]
    fn test_unload_all_runs_in_reverse_order() {
        let host = host();
        let mut registry = PluginRegistry::new();
        let descriptor = PluginDescriptor::of::<Tile>();
        for name in ["a", "b", "c"] {
            registry
                .register(&descriptor, tile_config(name, json!({})), host.clone())
                .unwrap();
        }
        registry.load_all();
        assert_eq!(registry.names(), ["a", "b", "c"]);

        let journal = journal_of(&host);
        assert!(registry.unload_all().is_empty());
        let unloads: Vec<_> = journal
            .lock()
            .iter()
            .filter(|e| e.starts_with("unload:"))
            .cloned()
            .collect();
        assert_eq!(unloads, ["unload:c", "unload:b", "unload:a"]);
        assert!(
            registry
                .iter()
                .all(|p| p.state() == LifecycleState::Unloaded)
        );

        // Nothing left to unload.
        assert!(registry.unload_all().is_empty());
    }

    #[test]
    fn test_remove_unloads_and_releases_listeners() {
        let host = host();
        let mut registry = PluginRegistry::new();
        registry
            .register(
                &PluginDescriptor::of::<Tile>(),
                tile_config("clock", json!({})),
                host.clone(),
            )
            .unwrap();
        registry.load_all();
        assert_eq!(host.events().listener_count("refresh"), 1);

        registry.remove("clock").unwrap();
        assert!(registry.is_empty());
        assert_eq!(host.events().listener_count("refresh"), 0);

        assert!(matches!(
            registry.remove("clock"),
            Err(PluginError::NotFound(_))
        ));
    }

    #[test]
    fn test_set_enabled() {
        let host = host();
        let mut registry = PluginRegistry::new();
        registry
            .register(
                &PluginDescriptor::of::<Tile>(),
                tile_config("clock", json!({})),
                host,
            )
            .unwrap();

        registry.set_enabled("clock", false).unwrap();
        assert!(!registry.get("clock").unwrap().enabled());
        assert!(registry.set_enabled("missing", true).is_err());
    }
}
