//! # Quarkboard
//!
//! Plugins for a dashboard host application.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  construct   ┌──────────────────────────────┐
//! │  Quarkboard  │─────────────▶│ Plugin "clock"   (context)   │──┐
//! │  (registry)  │─────────────▶│ Plugin "weather" (context)   │──┤ emit / on / once
//! └──────┬───────┘              └──────────────────────────────┘  │
//!        │ compile                                                ▼
//!        ▼                                               ┌─────────────────┐
//! ┌──────────────┐                                       │  HostContext    │
//! │    Bundle    │ document, window, scripts, styles     │  (event bus)    │
//! └──────────────┘                                       └─────────────────┘
//! ```
//!
//! - **Plugins** implement [`Plugin`](prelude::Plugin); every hook has a
//!   no-op default, so a plugin overrides only what it contributes.
//! - **The host** drives each plugin through `init → load → unload` and
//!   rejects calls made in the wrong state.
//! - **Listeners** a plugin registers through its context are removed when
//!   it unloads.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quarkboard::prelude::*;
//!
//! struct Clock {
//!     ctx: PluginContext,
//! }
//!
//! impl PluginFactory for Clock {
//!     fn create(ctx: PluginContext) -> Self {
//!         Self { ctx }
//!     }
//! }
//!
//! impl Plugin for Clock {
//!     fn context(&self) -> &PluginContext {
//!         &self.ctx
//!     }
//!
//!     fn html(&self, document: &mut Document, _window: &mut Window) {
//!         document.append_body("<time id=\"clock\"></time>");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut board = Quarkboard::builder().build()?;
//!     board.register::<Clock>(PluginConfig::new("clock", "plugins/clock"))?;
//!     board.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use quarkboard_core as core;
pub use quarkboard_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use quarkboard::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use quarkboard_runtime::{Bundle, Cli, Quarkboard, QuarkboardBuilder};

    // Plugin contract
    pub use quarkboard_core::{
        BoxError, Directories, Document, Plugin, PluginConfig, PluginContext, PluginFactory,
        PluginIdentity, PluginKind, Window,
    };

    // Lifecycle and errors, for hosts driving plugins by hand
    pub use quarkboard_core::{LifecycleState, PluginDescriptor, PluginError, PluginInstance};
    pub use quarkboard_runtime::{RuntimeError, RuntimeResult};
}
