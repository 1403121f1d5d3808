//! Plugin contract for Quarkboard.
//!
//! # Architecture
//!
//! A concrete plugin is a struct that embeds a [`PluginContext`] and
//! implements [`Plugin`]. Every hook on [`Plugin`] has a no-op default, so a
//! plugin overrides only what it contributes.
//!
//! A [`PluginDescriptor`] is the *static, `Copy` handle* to a plugin type. The
//! host passes it to [`PluginInstance::construct`], which builds the context,
//! creates the plugin through [`PluginFactory::create`] and runs `init` before
//! returning. From then on the host drives the instance:
//!
//! ```text
//! construct() ──► Initialized
//!      load() ──► Loaded      (hook succeeded)
//!             ──► Failed      (hook returned an error)
//!    unload() ──► Unloaded    (from Loaded or Failed)
//! ```
//!
//! `html`, `scripts` and `styles` are only accepted while `Loaded`.
//!
//! # Configuration
//!
//! [`PluginConfig`] carries the plugin name, its root directory, the parsed
//! package descriptor (`pjson`) and the plugin's section of the host
//! configuration. Asset directories declared under `pjson.directories` are
//! projected on demand by [`PluginConfig::directories`].
//!
//! # Events
//!
//! Plugins never own a bus. [`PluginContext::on`], [`PluginContext::once`] and
//! [`PluginContext::emit`] forward onto the host's [`EventBus`]. Registrations
//! made through the context are tracked and removed once the plugin is
//! unloaded or dropped.
//!
//! [`EventBus`]: crate::EventBus

pub mod config;
pub mod context;
pub mod core;
pub mod descriptor;
pub mod instance;

pub use config::{Directories, DirectoryKind, PluginConfig};
pub use context::PluginContext;
pub use core::{AsAny, Plugin, PluginFactory, PluginIdentity, PluginKind};
pub use descriptor::{PluginDescriptor, QUARKBOARD_PLUGIN_API_VERSION};
pub use instance::{LifecycleState, PluginInstance};
