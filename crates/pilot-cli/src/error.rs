//! CLI error type and exit codes.

use std::fmt::{self, Display, Formatter};

use pilot_config::ConfigError;
use pilot_copytool::{CopytoolError, TransferError};

/// CLI-level error type distinguishing bad input, operational failures, and
/// classified transfer failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
    Transfer(TransferError),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
            Self::Transfer(_) => 4,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
            Self::Transfer(error) => format!(
                "transfer failed [{} {}]: {}",
                error.code.code(),
                error.state.as_str(),
                error.message
            ),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<CopytoolError> for CliError {
    fn from(err: CopytoolError) -> Self {
        match err {
            CopytoolError::Transfer(error) => Self::Transfer(error),
            CopytoolError::InvalidInput {
                field,
                reason,
                value,
            } => Self::Validation(match value {
                Some(value) => format!("invalid file record {value}: {field} {reason}"),
                None => format!("invalid file record: {field} {reason}"),
            }),
            other => Self::Failure(other.into()),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidField {
                section,
                field,
                value,
                reason,
            } => Self::Validation(match value {
                Some(value) => format!("invalid configuration {section}.{field}={value}: {reason}"),
                None => format!("invalid configuration {section}.{field}: {reason}"),
            }),
            other => Self::Failure(other.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilot_copytool::{ErrorCode, ErrorState};

    #[test]
    fn exit_codes_distinguish_variants() {
        assert_eq!(CliError::validation("bad").exit_code(), 2);
        assert_eq!(CliError::failure(anyhow::anyhow!("boom")).exit_code(), 3);
        let transfer = TransferError::new(ErrorCode::StageInFailed, ErrorState::CopyError, "nope");
        assert_eq!(CliError::Transfer(transfer).exit_code(), 4);
    }

    #[test]
    fn batch_abort_maps_to_transfer_error() {
        let classified = TransferError::new(
            ErrorCode::PutAdMismatch,
            ErrorState::AdMismatch,
            "Failed to stageout: CRC mismatched",
        );
        let err = CliError::from(CopytoolError::Transfer(classified));
        assert_eq!(
            err.display_message(),
            "transfer failed [1172 AD_MISMATCH]: Failed to stageout: CRC mismatched"
        );
    }

    #[test]
    fn invalid_record_is_a_validation_error() {
        let err = CliError::from(CopytoolError::InvalidInput {
            field: "ddmendpoint",
            reason: "missing",
            value: Some("user.jdoe:out.root".to_string()),
        });
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.display_message(),
            "invalid file record user.jdoe:out.root: ddmendpoint missing"
        );
    }

    #[test]
    fn config_parse_failure_keeps_source_chain() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CliError::from(ConfigError::Json {
            path: "copytool.json".into(),
            source,
        });
        assert_eq!(err.exit_code(), 3);
        assert!(
            err.display_message()
                .starts_with("configuration document is invalid: ")
        );
    }
}
