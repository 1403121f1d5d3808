//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LoggingConfig, PluginsConfig, QuarkboardConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &QuarkboardConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_plugins_config(&config.plugins)?;
    Ok(())
}

/// Validates logging configuration.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if let Some(module) = logging.filters.keys().find(|m| m.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Invalid log filter module name: {module:?}"
        )));
    }

    Ok(())
}

/// Validates plugin configuration.
fn validate_plugins_config(plugins: &PluginsConfig) -> ConfigResult<()> {
    if plugins.disabled.iter().any(|name| name.trim().is_empty()) {
        return Err(ConfigError::validation(
            "plugins.disabled must not contain empty names",
        ));
    }

    if plugins.settings.keys().any(|name| name.trim().is_empty()) {
        return Err(ConfigError::validation(
            "plugins.settings must not contain empty plugin names",
        ));
    }

    Ok(())
}
