//! Built-in values for the copytool configuration.
//!
//! # Design
//! - Centralize defaults so the model, loader, and tests agree on them.

/// Launcher used to resolve the rucio client from `PATH`.
pub(crate) const DEFAULT_EXECUTABLE: &str = "/usr/bin/env";
/// Name of the rucio client program.
pub(crate) const DEFAULT_CLIENT: &str = "rucio";
/// Log line format forced on the rucio client; stderr parsing depends on it.
pub const DEFAULT_LOGGING_FORMAT: &str = "%(asctime)s %(levelname)s [%(message)s]";
/// File name of the JSON summary written by `rucio upload --summary`.
pub const DEFAULT_SUMMARY_FILE: &str = "rucio_upload.json";
/// Default log level when neither file nor environment provide one.
pub(crate) const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable overriding the launcher executable.
pub(crate) const ENV_EXECUTABLE: &str = "PILOT_RUCIO_EXECUTABLE";
/// Environment variable overriding the client program name.
pub(crate) const ENV_CLIENT: &str = "PILOT_RUCIO_CLIENT";
/// Environment variable overriding the default batch working directory.
pub(crate) const ENV_WORKDIR: &str = "PILOT_COPYTOOL_WORKDIR";
/// Environment variable overriding the per-invocation timeout.
pub(crate) const ENV_TIMEOUT_SECS: &str = "PILOT_COPYTOOL_TIMEOUT_SECS";
/// Environment variable overriding the log level.
pub(crate) const ENV_LOG_LEVEL: &str = "PILOT_LOG_LEVEL";
/// Environment variable overriding the log format.
pub(crate) const ENV_LOG_FORMAT: &str = "PILOT_LOG_FORMAT";
