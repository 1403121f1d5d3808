//! Gathers plugin contributions into one render bundle.

use std::collections::HashSet;

use quarkboard_core::{Document, LifecycleState, PluginResult, Window};
use tracing::trace;

use crate::registry::PluginRegistry;

/// Everything the plugins contributed to one page render.
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    pub document: Document,
    pub window: Window,
    /// Script references, first occurrence wins.
    pub scripts: Vec<String>,
    /// Stylesheet references, first occurrence wins.
    pub styles: Vec<String>,
}

/// Asks every enabled, loaded plugin for its contributions.
///
/// Plugins are visited in registration order. Disabled plugins and plugins
/// that are not `Loaded` are skipped without being called.
#[derive(Debug, Default)]
pub struct ContributionCollector {
    bundle: Bundle,
    seen_scripts: HashSet<String>,
    seen_styles: HashSet<String>,
}

impl ContributionCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing document, e.g. a page template.
    pub fn with_document(document: Document) -> Self {
        Self {
            bundle: Bundle {
                document,
                ..Bundle::default()
            },
            ..Self::default()
        }
    }

    pub fn collect(mut self, registry: &PluginRegistry) -> PluginResult<Bundle> {
        for instance in registry.iter() {
            if instance.state() != LifecycleState::Loaded {
                trace!(plugin = %instance.name(), state = %instance.state(), "Skipping plugin");
                continue;
            }
            if !instance.enabled() {
                trace!(plugin = %instance.name(), "Skipping disabled plugin");
                continue;
            }

            instance.html(&mut self.bundle.document, &mut self.bundle.window)?;
            for script in instance.scripts()? {
                if self.seen_scripts.insert(script.clone()) {
                    self.bundle.scripts.push(script);
                }
            }
            for style in instance.styles()? {
                if self.seen_styles.insert(style.clone()) {
                    self.bundle.styles.push(style);
                }
            }
        }
        Ok(self.bundle)
    }
}
