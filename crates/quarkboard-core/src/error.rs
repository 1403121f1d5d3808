//! Error types for the plugin contract.
//!
//! Accessors and derived values never fail. Errors only arise when the host
//! drives the lifecycle out of order, or when an overridden hook returns one.

use std::fmt;

use thiserror::Error;

use crate::plugin::LifecycleState;

/// Boxed error returned by plugin hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A host-driven call on a plugin instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Init,
    Load,
    Html,
    Scripts,
    Styles,
    Unload,
}

impl Operation {
    /// Returns the operation name as it appears in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Load => "load",
            Self::Html => "html",
            Self::Scripts => "scripts",
            Self::Styles => "styles",
            Self::Unload => "unload",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while constructing or driving a plugin.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The host called an operation the current lifecycle state does not allow.
    #[error("cannot call `{operation}` on plugin '{plugin}' while it is {state}")]
    Lifecycle {
        plugin: String,
        operation: Operation,
        state: LifecycleState,
    },

    /// An overridden lifecycle hook returned an error.
    #[error("plugin '{plugin}' failed during `{stage}`: {source}")]
    Hook {
        plugin: String,
        stage: Operation,
        #[source]
        source: BoxError,
    },

    /// The descriptor was built against an incompatible plugin API.
    #[error("plugin '{plugin}' targets incompatible plugin API {version:#010x}")]
    IncompatibleApi { plugin: String, version: u32 },

    /// A plugin with the same name is already registered.
    #[error("plugin already registered: {0}")]
    DuplicatePlugin(String),

    /// No plugin with the given name is registered.
    #[error("plugin not found: {0}")]
    NotFound(String),
}

impl PluginError {
    pub(crate) fn lifecycle(
        plugin: impl Into<String>,
        operation: Operation,
        state: LifecycleState,
    ) -> Self {
        Self::Lifecycle {
            plugin: plugin.into(),
            operation,
            state,
        }
    }

    pub(crate) fn hook(plugin: impl Into<String>, stage: Operation, source: BoxError) -> Self {
        Self::Hook {
            plugin: plugin.into(),
            stage,
            source,
        }
    }
}

/// Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;
