//! # Design
//!
//! - Provide structured, constant-message errors for the copytool.
//! - Keep the pilot's numeric error codes and state tags in closed enumerations.
//! - A batch abort carries the classified [`TransferError`] unchanged so callers can branch on it.

use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for copytool operations.
pub type CopytoolResult<T> = Result<T, CopytoolError>;

/// Pilot error codes surfaced by the copytool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Generic download failure.
    StageInFailed,
    /// Generic upload failure.
    StageOutFailed,
    /// MD5 of an uploaded file differs from the remote value.
    PutMd5Mismatch,
    /// MD5 of a downloaded file differs from the catalog value.
    GetMd5Mismatch,
    /// Adler-32 of a downloaded file differs from the catalog value.
    GetAdMismatch,
    /// Adler-32 of an uploaded file differs from the remote value.
    PutAdMismatch,
    /// The rucio server reported itself unavailable.
    RucioServiceUnavailable,
}

impl ErrorCode {
    /// Numeric value from the pilot error table.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::StageInFailed => 1099,
            Self::StageOutFailed => 1137,
            Self::PutMd5Mismatch => 1141,
            Self::GetMd5Mismatch => 1145,
            Self::GetAdMismatch => 1171,
            Self::PutAdMismatch => 1172,
            Self::RucioServiceUnavailable => 1219,
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.code())
    }
}

/// Short client state tag attached to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorState {
    /// The copy command itself failed.
    #[serde(rename = "COPY_ERROR")]
    CopyError,
    /// Adler-32 verification failed.
    #[serde(rename = "AD_MISMATCH")]
    AdMismatch,
    /// MD5 verification failed.
    #[serde(rename = "MD5_MISMATCH")]
    Md5Mismatch,
}

impl ErrorState {
    /// Render the tag the way the pilot reports it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CopyError => "COPY_ERROR",
            Self::AdMismatch => "AD_MISMATCH",
            Self::Md5Mismatch => "MD5_MISMATCH",
        }
    }
}

impl Display for ErrorState {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Structured outcome of a failed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct TransferError {
    /// Pilot error code.
    pub code: ErrorCode,
    /// Client state tag.
    pub state: ErrorState,
    /// Human-readable diagnostic.
    pub message: String,
}

impl TransferError {
    /// Build a transfer error from its parts.
    #[must_use]
    pub fn new(code: ErrorCode, state: ErrorState, message: impl Into<String>) -> Self {
        Self {
            code,
            state,
            message: message.into(),
        }
    }
}

/// Errors produced by the copytool.
#[derive(Debug, Error)]
pub enum CopytoolError {
    /// A non-ignorable failure aborted the batch.
    #[error("transfer batch aborted")]
    Transfer(#[source] TransferError),
    /// IO failures while interacting with the filesystem.
    #[error("copytool io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// JSON parsing failures for the upload summary.
    #[error("copytool json failure")]
    Json {
        /// Operation that triggered the JSON failure.
        operation: &'static str,
        /// Path involved in the JSON failure.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// The external client could not be started or awaited.
    #[error("copytool command failed to run")]
    Spawn {
        /// Program that was launched.
        program: String,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The external client exceeded its time budget and was killed.
    #[error("copytool command timed out")]
    Timeout {
        /// Program that was launched.
        program: String,
        /// Budget that was exceeded, in seconds.
        seconds: u64,
    },
    /// A classification pattern failed to compile.
    #[error("copytool classification pattern invalid")]
    RegexCompile {
        /// Pattern that failed.
        pattern: &'static str,
        /// Underlying regex error.
        source: regex::Error,
    },
    /// Input validation failures.
    #[error("copytool invalid input")]
    InvalidInput {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl CopytoolError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: serde_json::Error,
    ) -> Self {
        Self::Json {
            operation,
            path: path.into(),
            source,
        }
    }

    /// The classified failure when this error aborted a batch.
    #[must_use]
    pub const fn transfer(&self) -> Option<&TransferError> {
        match self {
            Self::Transfer(error) => Some(error),
            _ => None,
        }
    }
}

impl From<TransferError> for CopytoolError {
    fn from(error: TransferError) -> Self {
        Self::Transfer(error)
    }
}
