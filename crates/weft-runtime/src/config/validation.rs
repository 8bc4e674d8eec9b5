//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, LogRotation, LoggingConfig, WeftConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &WeftConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_plugin_sections(config)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File {
        match &logging.file_path {
            None => return Err(ConfigError::missing_field("logging.file_path")),
            Some(path) if path.file_name().is_none() => {
                return Err(ConfigError::validation(format!(
                    "Log file path has no file name: {}",
                    path.display()
                )));
            }
            Some(_) => {}
        }
    }

    if logging.rotation != LogRotation::Never && logging.max_files == 0 {
        return Err(ConfigError::validation(
            "logging.max_files must be at least 1 when rotation is enabled",
        ));
    }

    for module in logging.filters.keys() {
        if module.is_empty() || module.contains(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Invalid log filter target: '{module}'"
            )));
        }
    }

    Ok(())
}

/// Every plugin section must be a table (or empty).
fn validate_plugin_sections(config: &WeftConfig) -> ConfigResult<()> {
    for (name, section) in &config.plugins {
        if name.is_empty() {
            return Err(ConfigError::validation("Plugin section with empty name"));
        }
        if !(section.is_object() || section.is_null()) {
            return Err(ConfigError::validation(format!(
                "Configuration for plugin '{name}' must be a table"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    #[test]
    fn test_validate_empty_config() {
        let config = WeftConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_file_output_requires_path() {
        let mut config = WeftConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));

        config.logging.file_path = Some(PathBuf::from("logs/weft.log"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_rotation_needs_files() {
        let mut config = WeftConfig::default();
        config.logging.rotation = LogRotation::Daily;
        config.logging.max_files = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_plugin_section_must_be_table() {
        let mut config = WeftConfig::default();
        config
            .plugins
            .insert("slash".to_string(), serde_json::json!({ "enabled": true }));
        assert!(validate_config(&config).is_ok());

        config
            .plugins
            .insert("history".to_string(), serde_json::json!(42));
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }
}
