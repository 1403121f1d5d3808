//! Host runtime orchestration.
//!
//! [`Quarkboard`] owns the host context, the plugin registry and the loaded
//! configuration, and drives every plugin through
//! `start → compile* → stop`.
//!
//! ```rust,ignore
//! use quarkboard_runtime::Quarkboard;
//!
//! let mut board = Quarkboard::builder()
//!     .config_file("quarkboard.toml")
//!     .option("kiosk", true.into())
//!     .build()?;
//!
//! board.register::<Clock>(PluginConfig::new("clock", "plugins/clock"))?;
//! board.run().await?;
//! ```

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use quarkboard_core::{
    Document, Host, PluginConfig, PluginDescriptor, PluginError, PluginFactory, PluginInstance,
};
use serde_json::Value;
use tokio::signal;
use tracing::{error, info, warn};

use crate::cli::Cli;
use crate::collector::{Bundle, ContributionCollector};
use crate::config::{ConfigLoader, QuarkboardConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::host::HostContext;
use crate::logging;
use crate::options::Options;
use crate::registry::PluginRegistry;

/// A Quarkboard host: the plugins, the host they see, and the settings they
/// were configured from.
pub struct Quarkboard {
    config: QuarkboardConfig,
    host: Arc<HostContext>,
    registry: PluginRegistry,
}

impl Quarkboard {
    /// A host with default configuration and no options. Does not touch
    /// the global logger.
    pub fn new() -> Self {
        Self::with_parts(QuarkboardConfig::default(), Options::new())
    }

    pub fn builder() -> QuarkboardBuilder {
        QuarkboardBuilder::new()
    }

    /// Creates a host from loaded configuration and initializes logging
    /// from its `logging` section.
    pub fn from_config(config: QuarkboardConfig, options: Options) -> Self {
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            disabled = config.plugins.disabled.len(),
            options = options.len(),
            "Quarkboard initialized from configuration"
        );
        Self::with_parts(config, options)
    }

    fn with_parts(config: QuarkboardConfig, options: Options) -> Self {
        Self {
            config,
            host: Arc::new(HostContext::new(options)),
            registry: PluginRegistry::new(),
        }
    }

    pub fn config(&self) -> &QuarkboardConfig {
        &self.config
    }

    pub fn host(&self) -> &Arc<HostContext> {
        &self.host
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PluginRegistry {
        &mut self.registry
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Constructs and registers a plugin of type `P`.
    pub fn register<P: PluginFactory>(
        &mut self,
        config: PluginConfig,
    ) -> RuntimeResult<&mut PluginInstance> {
        self.register_descriptor(&PluginDescriptor::of::<P>(), config)
    }

    /// Constructs and registers a plugin from its descriptor.
    ///
    /// The plugin's `settings` come from `plugins.settings.<name>` unless
    /// the given config already carries some, and plugins listed in
    /// `plugins.disabled` start out disabled.
    pub fn register_descriptor(
        &mut self,
        descriptor: &PluginDescriptor,
        mut config: PluginConfig,
    ) -> RuntimeResult<&mut PluginInstance> {
        if config.settings().is_null() {
            let settings = self.config.plugins.settings_for(config.name());
            config = config.with_settings(settings);
        }
        let disabled = self.config.plugins.is_disabled(config.name());

        let host: Arc<dyn Host> = self.host.clone();
        let instance = self.registry.register(descriptor, config, host)?;
        if disabled {
            instance.set_enabled(false);
            info!(plugin = %instance.name(), "Plugin disabled by configuration");
        }
        Ok(instance)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Loads every registered plugin.
    ///
    /// All plugins are attempted. If any fail, the failures are reported as
    /// [`RuntimeError::LoadFailed`] and the failed plugins stay `Failed`
    /// until [`stop`](Self::stop).
    pub fn start(&mut self) -> RuntimeResult<()> {
        info!(plugins = self.registry.len(), "Starting Quarkboard");

        let failures = self.registry.load_all();
        if failures.is_empty() {
            return Ok(());
        }
        let names = failures
            .iter()
            .map(|e| match e {
                PluginError::Hook { plugin, .. } => plugin.clone(),
                other => other.to_string(),
            })
            .collect();
        Err(RuntimeError::LoadFailed(names))
    }

    /// Collects the contributions of every enabled, loaded plugin.
    pub fn compile(&self) -> RuntimeResult<Bundle> {
        Ok(ContributionCollector::new().collect(&self.registry)?)
    }

    /// Like [`compile`](Self::compile), starting from a template document.
    pub fn compile_into(&self, document: Document) -> RuntimeResult<Bundle> {
        Ok(ContributionCollector::with_document(document).collect(&self.registry)?)
    }

    /// Unloads every loaded or failed plugin in reverse registration order.
    ///
    /// Every plugin is unloaded even if an earlier one fails; the first
    /// failure is returned.
    pub fn stop(&mut self) -> RuntimeResult<()> {
        info!("Stopping Quarkboard");

        let mut failures = self.registry.unload_all().into_iter();
        match failures.next() {
            None => Ok(()),
            Some(first) => {
                for other in failures {
                    error!(error = %other, "Additional unload failure");
                }
                Err(first.into())
            }
        }
    }

    /// Starts the plugins, waits for Ctrl+C or SIGTERM, then stops them.
    pub async fn run(&mut self) -> RuntimeResult<()> {
        self.start_or_stop()?;
        info!("Quarkboard is running. Press Ctrl+C to stop.");

        if let Err(e) = wait_for_shutdown().await {
            warn!(error = %e, "Failed to listen for shutdown signals, stopping now");
        }

        self.stop()
    }

    /// Starts the plugins, awaits `shutdown`, then stops them.
    pub async fn run_until<F>(&mut self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start_or_stop()?;
        shutdown.await;
        self.stop()
    }

    /// Plugins that loaded before a failure are unloaded again before the
    /// start error is returned.
    fn start_or_stop(&mut self) -> RuntimeResult<()> {
        if let Err(e) = self.start() {
            error!(error = %e, "Quarkboard failed to start");
            if let Err(stop_err) = self.stop() {
                error!(error = %stop_err, "Cleanup after failed start also failed");
            }
            return Err(e);
        }
        Ok(())
    }
}

impl Default for Quarkboard {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for Ctrl+C, or SIGTERM on unix.
async fn wait_for_shutdown() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                info!("Received Ctrl+C, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("Received Ctrl+C, shutting down");
    }

    Ok(())
}

// =============================================================================
// QuarkboardBuilder
// =============================================================================

/// Builder that loads configuration and collects host options.
pub struct QuarkboardBuilder {
    config_loader: ConfigLoader,
    options: Options,
}

impl QuarkboardBuilder {
    /// Searches the current directory, then the user config directory
    /// (`<config_dir>/quarkboard`).
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new()
                .with_current_dir()
                .with_user_config_dir(),
            options: Options::new(),
        }
    }

    /// Applies `--config`, `--profile` and every `--opt`.
    pub fn from_cli(cli: &Cli) -> Self {
        let mut builder = Self::new();
        if let Some(path) = &cli.config {
            builder = builder.config_file(path);
        }
        if let Some(profile) = &cli.profile {
            builder = builder.profile(profile);
        }
        builder.options.extend(cli.options.iter().cloned());
        builder
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges programmatic defaults under files and environment.
    pub fn merge(mut self, config: QuarkboardConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Sets a host option, replacing an earlier value.
    pub fn option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key, value);
        self
    }

    pub fn build(self) -> RuntimeResult<Quarkboard> {
        let config = self.config_loader.load()?;
        Ok(Quarkboard::from_config(config, self.options))
    }
}

impl Default for QuarkboardBuilder {
    fn default() -> Self {
        Self::new()
    }
}
