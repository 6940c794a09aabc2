//! Command handlers grouped by concern.

pub(crate) mod classify;
pub(crate) mod stage;
