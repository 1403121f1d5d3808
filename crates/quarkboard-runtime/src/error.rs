//! Runtime error types.

use quarkboard_core::PluginError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while driving plugins.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A plugin could not be constructed or refused a lifecycle call.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Host configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// One or more plugins failed their `load` hook. The named plugins are
    /// left `Failed`; the rest are loaded.
    #[error("{} plugin(s) failed to load: {}", .0.len(), .0.join(", "))]
    LoadFailed(Vec<String>),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
