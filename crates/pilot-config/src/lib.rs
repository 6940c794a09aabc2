#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(missing_docs, unreachable_pub)]

//! Typed configuration for the rucio copytool adapter.
//!
//! Layout: `model.rs` (typed settings), `defaults.rs` (built-in values),
//! `validate.rs` (parsing helpers), `loader.rs` (file + environment layering).

mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use defaults::{DEFAULT_LOGGING_FORMAT, DEFAULT_SUMMARY_FILE};
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, EnvSource, ProcessEnv};
pub use model::{CopytoolConfig, LogFormatSetting, RucioSettings, TelemetryConfig};
