//! Quarkboard Runtime - the host side of the plugin contract.
//!
//! This crate provides:
//! - Plugin orchestration (`Quarkboard`, `PluginRegistry`)
//! - Contribution collection into a render `Bundle`
//! - The `Host` implementation plugins are constructed against
//! - Configuration loading (figment) and logging setup (tracing-subscriber)
//! - Command-line options shared by host binaries
//!
//! ```ignore
//! use clap::Parser;
//! use quarkboard_runtime::{Cli, QuarkboardBuilder};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cli = Cli::parse();
//!     let mut board = QuarkboardBuilder::from_cli(&cli).build()?;
//!
//!     board.register::<Clock>(PluginConfig::new("clock", "plugins/clock"))?;
//!
//!     // Loads every plugin, waits for Ctrl+C, then unloads them.
//!     board.run().await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod options;
pub mod registry;
pub mod runtime;

// Re-exports
pub use cli::Cli;
pub use collector::{Bundle, ContributionCollector};
pub use config::{ConfigError, ConfigLoader, ConfigResult, Profile, QuarkboardConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use host::HostContext;
pub use logging::{LoggingBuilder, SpanEvents};
pub use options::{Options, parse_option};
pub use registry::PluginRegistry;
pub use runtime::{Quarkboard, QuarkboardBuilder};

// Re-export tracing for use by plugin crates
pub use tracing;

/// Prelude module for convenient imports.
///
/// This provides the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `instrument` attribute
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, trace, warn};
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use quarkboard_core::{
        BoxError, Document, Plugin, PluginConfig, PluginContext, PluginFactory, Window,
    };
    use serde::Deserialize;
    use serde_json::{Value, json};

    use crate::host::HostContext;

    pub type Journal = Arc<Mutex<Vec<String>>>;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct TileSettings {
        fail_load: bool,
        scripts: Vec<String>,
        styles: Vec<String>,
    }

    /// A dashboard tile driven entirely by its settings. Reports `load` and
    /// `unload` on the host's `journal` event.
    pub struct Tile {
        ctx: PluginContext,
        settings: TileSettings,
    }

    impl PluginFactory for Tile {
        fn create(ctx: PluginContext) -> Self {
            let settings = ctx.config().settings_as().unwrap_or_default();
            Self { ctx, settings }
        }
    }

    impl Plugin for Tile {
        fn context(&self) -> &PluginContext {
            &self.ctx
        }

        fn load(&mut self) -> Result<(), BoxError> {
            self.ctx
                .emit("journal", &[json!(format!("load:{}", self.name()))]);
            if self.settings.fail_load {
                return Err("tile refused to load".into());
            }
            self.ctx.on("refresh", |_| {});
            Ok(())
        }

        fn html(&self, document: &mut Document, window: &mut Window) {
            document.append_body(format!("<section id=\"{}\"></section>", self.name()));
            window.set(self.name(), json!({ "loaded": true }));
        }

        fn scripts(&self) -> Vec<String> {
            self.settings.scripts.clone()
        }

        fn styles(&self) -> Vec<String> {
            self.settings.styles.clone()
        }

        fn unload(&mut self) -> Result<(), BoxError> {
            self.ctx
                .emit("journal", &[json!(format!("unload:{}", self.name()))]);
            Ok(())
        }
    }

    pub fn tile_config(name: &str, settings: Value) -> PluginConfig {
        PluginConfig::new(name, format!("/plugins/{name}")).with_settings(settings)
    }

    /// Records every `journal` event emitted on `host`.
    pub fn journal_of(host: &HostContext) -> Journal {
        use quarkboard_core::Host;

        let journal: Journal = Arc::default();
        let sink = Arc::clone(&journal);
        host.events().on("journal", move |args: &[Value]| {
            if let Some(entry) = args.first().and_then(Value::as_str) {
                sink.lock().push(entry.to_string());
            }
        });
        journal
    }
}
