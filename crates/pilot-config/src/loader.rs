//! Layered configuration loading: defaults, then a JSON document, then environment.
//!
//! # Design
//! - Environment access goes through [`EnvSource`] so tests never mutate the process env.
//! - Every layer is validated once, after the final merge.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::defaults::{
    ENV_CLIENT, ENV_EXECUTABLE, ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_TIMEOUT_SECS, ENV_WORKDIR,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{CopytoolConfig, LogFormatSetting};
use crate::validate::{parse_timeout_secs, validate_config};

/// Read-only view of environment variables.
pub trait EnvSource {
    /// Look up a variable, returning `None` when unset or not valid unicode.
    fn var(&self, name: &str) -> Option<String>;
}

/// [`EnvSource`] backed by the current process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl<F> EnvSource for F
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Builder that resolves a [`CopytoolConfig`] from its layers.
pub struct ConfigLoader {
    path: Option<PathBuf>,
    env: Box<dyn EnvSource>,
}

impl ConfigLoader {
    /// Loader reading the optional document at `path` and the process environment.
    #[must_use]
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            env: Box::new(ProcessEnv),
        }
    }

    /// Replace the environment source.
    #[must_use]
    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// Resolve the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the document cannot be read or parsed, or when an
    /// override or the merged result fails validation.
    pub fn load(&self) -> ConfigResult<CopytoolConfig> {
        let mut config = match &self.path {
            Some(path) => read_document(path)?,
            None => CopytoolConfig::default(),
        };
        self.apply_env(&mut config)?;
        validate_config(&config)?;
        debug!(
            client = %config.rucio.client,
            timeout_secs = ?config.rucio.timeout_secs,
            "copytool configuration resolved"
        );
        Ok(config)
    }

    fn apply_env(&self, config: &mut CopytoolConfig) -> ConfigResult<()> {
        if let Some(value) = self.env.var(ENV_EXECUTABLE) {
            config.rucio.executable = PathBuf::from(value);
        }
        if let Some(value) = self.env.var(ENV_CLIENT) {
            config.rucio.client = value;
        }
        if let Some(value) = self.env.var(ENV_WORKDIR) {
            config.workdir = Some(PathBuf::from(value));
        }
        if let Some(value) = self.env.var(ENV_TIMEOUT_SECS) {
            config.rucio.timeout_secs = Some(parse_timeout_secs(&value)?);
        }
        if let Some(value) = self.env.var(ENV_LOG_LEVEL) {
            config.telemetry.level = value;
        }
        if let Some(value) = self.env.var(ENV_LOG_FORMAT) {
            config.telemetry.format = Some(LogFormatSetting::from_str(&value)?);
        }
        Ok(())
    }
}

fn read_document(path: &Path) -> ConfigResult<CopytoolConfig> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        operation: "read_config",
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}
