//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers consumed by the copytool service and the CLI.
//! - Every field has a default so partial documents deserialize.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults::{
    DEFAULT_CLIENT, DEFAULT_EXECUTABLE, DEFAULT_LOG_LEVEL, DEFAULT_LOGGING_FORMAT,
    DEFAULT_SUMMARY_FILE,
};
use crate::error::ConfigError;

/// Complete configuration snapshot for one copytool process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopytoolConfig {
    /// How the rucio client is launched.
    pub rucio: RucioSettings,
    /// Default batch working directory when records carry none.
    pub workdir: Option<PathBuf>,
    /// Logging settings.
    pub telemetry: TelemetryConfig,
}

/// Settings describing how the external rucio client is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RucioSettings {
    /// Launcher executable (the client is passed as its first argument).
    pub executable: PathBuf,
    /// Client program name.
    pub client: String,
    /// Whether `-v` is passed to the client.
    pub verbose: bool,
    /// Value exported as `RUCIO_LOGGING_FORMAT` to the client.
    pub logging_format: String,
    /// File name of the upload summary artifact.
    pub summary_file: String,
    /// Optional wall-clock limit per invocation, in seconds.
    pub timeout_secs: Option<u64>,
}

impl RucioSettings {
    /// Invocation timeout as a [`Duration`], if configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for RucioSettings {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            client: DEFAULT_CLIENT.to_string(),
            verbose: true,
            logging_format: DEFAULT_LOGGING_FORMAT.to_string(),
            summary_file: DEFAULT_SUMMARY_FILE.to_string(),
            timeout_secs: None,
        }
    }
}

/// Logging configuration carried in the config document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Log level or `EnvFilter` directive.
    pub level: String,
    /// Output format; `None` lets the build profile decide.
    pub format: Option<LogFormatSetting>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: None,
        }
    }
}

/// Log output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    /// Human-readable lines.
    Pretty,
    /// Structured JSON objects.
    Json,
}

impl LogFormatSetting {
    /// Render the format as its lowercase string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl FromStr for LogFormatSetting {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::invalid(
                "telemetry",
                "format",
                Some(other.to_string()),
                "unknown_format",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn partial_document_uses_defaults() {
        let config: CopytoolConfig =
            serde_json::from_value(json!({ "rucio": { "timeout_secs": 30 } }))
                .expect("partial config should parse");
        assert_eq!(config.rucio.client, "rucio");
        assert_eq!(config.rucio.summary_file, "rucio_upload.json");
        assert_eq!(config.rucio.timeout(), Some(Duration::from_secs(30)));
        assert!(config.rucio.verbose);
        assert_eq!(config.telemetry.level, "info");
        assert!(config.workdir.is_none());
    }

    #[test]
    fn log_format_parses_and_formats() {
        assert_eq!(
            LogFormatSetting::from_str("json").expect("json"),
            LogFormatSetting::Json
        );
        assert_eq!(LogFormatSetting::Pretty.as_str(), "pretty");
        assert!(LogFormatSetting::from_str("xml").is_err());
    }
}
