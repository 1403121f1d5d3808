//! # Quarkboard Core
//!
//! The plugin contract of the Quarkboard host application.
//!
//! A plugin is a unit of optional functionality that the host constructs,
//! drives through a fixed lifecycle, and asks for document contributions:
//!
//! ```text
//! construct ──► init ──► load ──► html / scripts / styles (0..n) ──► unload
//! ```
//!
//! This crate provides:
//!
//! - **Plugin contract**: the [`Plugin`] trait with no-op defaults, the
//!   [`PluginContext`] every concrete plugin embeds, and [`PluginKind`] for
//!   nominal type identity.
//! - **Lifecycle driver**: [`PluginInstance`] enforces the
//!   `Created → Initialized → Loaded → Unloaded` ordering and rejects
//!   out-of-order calls with [`PluginError::Lifecycle`].
//! - **Event delegation**: the host-owned, synchronous [`EventBus`] and the
//!   [`Host`] boundary plugins forward onto.
//! - **Render boundary**: the [`Document`] and [`Window`] pair handed to
//!   [`Plugin::html`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use quarkboard_core::{Plugin, PluginContext, PluginFactory, PluginInstance};
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
//!     fn scripts(&self) -> Vec<String> {
//!         vec!["clock.js".into()]
//!     }
//! }
//!
//! let mut clock = PluginInstance::new::<Clock>(config, host)?;
//! clock.load()?;
//! assert_eq!(clock.scripts()?, ["clock.js"]);
//! clock.unload()?;
//! ```

pub mod document;
pub mod error;
pub mod event;
pub mod host;
pub mod plugin;

pub use document::{Document, Window};
pub use error::{BoxError, Operation, PluginError, PluginResult};
pub use event::{EventBus, Listener, ListenerId};
pub use host::Host;
pub use plugin::{
    AsAny, Directories, DirectoryKind, LifecycleState, Plugin, PluginConfig, PluginContext,
    PluginDescriptor, PluginFactory, PluginIdentity, PluginInstance, PluginKind,
    QUARKBOARD_PLUGIN_API_VERSION,
};

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;

    use serde_json::Value;

    use crate::{EventBus, Host};

    /// Minimal host used by unit tests.
    #[derive(Default)]
    pub struct TestHost {
        pub bus: EventBus,
        pub options: HashMap<String, Value>,
    }

    impl Host for TestHost {
        fn events(&self) -> &EventBus {
            &self.bus
        }

        fn opt(&self, option: &str) -> Option<Value> {
            self.options.get(option).cloned()
        }
    }
}
