//! Configuration module for the Quarkboard runtime.
//!
//! This module provides figment-based configuration loading and validation
//! for logging and host-side plugin settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile};
pub use schema::{
    LogFormat, LogLevel, LogOutput, LoggingConfig, PluginsConfig, QuarkboardConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
