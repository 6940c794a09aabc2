//! Process-level span guard.
//!
//! # Design
//! - Every log line emitted while a CLI command runs carries the command name and build SHA.

use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the command-level span entered for the lifetime of the process.
pub struct CommandContextGuard {
    _guard: Entered<'static>,
}

impl CommandContextGuard {
    /// Enter the command-level tracing span for the lifetime of the guard.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        let command = command.into();
        let span: &'static Span = Box::leak(Box::new(
            tracing::info_span!("copytool", command = %command, build_sha = %build_sha()),
        ));
        let guard = span.enter();
        Self { _guard: guard }
    }
}
