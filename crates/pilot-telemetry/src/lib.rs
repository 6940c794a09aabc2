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

//! Logging primitives shared across the pilot copytool workspace.
//!
//! Layout: `init.rs` (subscriber installation), `context.rs` (process-level
//! span guard), `error.rs` (typed failures).

pub mod context;
pub mod error;
pub mod init;

pub use context::CommandContextGuard;
pub use error::{Result, TelemetryError};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
