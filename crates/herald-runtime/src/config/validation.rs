//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{DispatcherSettings, HeraldConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &HeraldConfig) -> ConfigResult<()> {
    validate_dispatcher(&config.dispatcher)?;
    validate_logging(&config.logging)?;
    Ok(())
}

fn validate_dispatcher(dispatcher: &DispatcherSettings) -> ConfigResult<()> {
    if dispatcher.prefix.is_empty() {
        return Err(ConfigError::missing_field("dispatcher.prefix"));
    }

    if dispatcher.prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(
            "Command prefix cannot contain whitespace",
        ));
    }

    if dispatcher.lookup_timeout_ms == 0 {
        return Err(ConfigError::validation(
            "Lookup timeout must be greater than 0",
        ));
    }

    if dispatcher.default_lang.is_empty() {
        return Err(ConfigError::missing_field("dispatcher.default_lang"));
    }

    if dispatcher.owners.iter().any(|id| id.trim().is_empty()) {
        return Err(ConfigError::validation("Owner IDs cannot be empty"));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.max_files == 0 {
        return Err(ConfigError::validation(
            "At least one log file must be kept",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&HeraldConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_empty_prefix() {
        let mut config = HeraldConfig::default();
        config.dispatcher.prefix = String::new();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { field }) if field == "dispatcher.prefix"
        ));

        config.dispatcher.prefix = "! ".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = HeraldConfig::default();
        config.dispatcher.lookup_timeout_ms = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_validate_file_retention() {
        let mut config = HeraldConfig::default();
        config.logging.output = LogOutput::File;
        config.logging.max_files = 0;
        assert!(validate_config(&config).is_err());
    }
}
