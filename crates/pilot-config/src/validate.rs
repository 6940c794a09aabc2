//! Validation helpers and parsing utilities for configuration values.

use crate::error::{ConfigError, ConfigResult};
use crate::model::CopytoolConfig;

/// Parse a timeout expressed in whole seconds; zero is rejected.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is not a positive integer.
pub fn parse_timeout_secs(value: &str) -> ConfigResult<u64> {
    let secs = value.trim().parse::<u64>().map_err(|_| {
        ConfigError::invalid("rucio", "timeout_secs", Some(value.to_string()), "not_an_integer")
    })?;
    if secs == 0 {
        return Err(ConfigError::invalid(
            "rucio",
            "timeout_secs",
            Some(value.to_string()),
            "must_be_positive",
        ));
    }
    Ok(secs)
}

/// Check cross-field constraints of a fully layered configuration.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] naming the first offending field.
pub fn validate_config(config: &CopytoolConfig) -> ConfigResult<()> {
    if config.rucio.executable.as_os_str().is_empty() {
        return Err(ConfigError::invalid("rucio", "executable", None, "empty"));
    }
    ensure_non_empty("rucio", "client", &config.rucio.client)?;
    ensure_non_empty("rucio", "summary_file", &config.rucio.summary_file)?;
    if config.rucio.summary_file.contains('/') {
        return Err(ConfigError::invalid(
            "rucio",
            "summary_file",
            Some(config.rucio.summary_file.clone()),
            "must_be_file_name",
        ));
    }
    if config.rucio.timeout_secs == Some(0) {
        return Err(ConfigError::invalid(
            "rucio",
            "timeout_secs",
            Some("0".to_string()),
            "must_be_positive",
        ));
    }
    ensure_non_empty("telemetry", "level", &config.telemetry.level)
}

fn ensure_non_empty(section: &'static str, field: &'static str, value: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::invalid(section, field, None, "empty"));
    }
    Ok(())
}
