//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use pilot_copytool::{BatchReport, FileRecord, TransferError, TransferStatus};
use serde_json::json;

use crate::cli::OutputFormat;
use crate::error::{CliError, CliResult};

pub(crate) fn format_batch(
    files: &[FileRecord],
    report: &BatchReport,
    format: OutputFormat,
) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_pretty_json(&json!({ "report": report, "files": files })),
        OutputFormat::Table => {
            let mut lines = vec![format!(
                "{:<48} {:<12} {:>6} TURL",
                "DID", "STATUS", "CODE"
            )];
            for record in files {
                lines.push(format!(
                    "{:<48} {:<12} {:>6} {}",
                    record.did(),
                    status_label(record.status),
                    record
                        .status_code()
                        .map_or_else(|| "-".to_string(), |code| code.to_string()),
                    record.turl.as_deref().unwrap_or("-")
                ));
            }
            for failure in &report.failures {
                lines.push(format!(
                    "failed {}: [{} {}] {}",
                    failure.did,
                    failure.error.code.code(),
                    failure.error.state.as_str(),
                    failure.error.message
                ));
            }
            lines.push(format!(
                "attempted: {} transferred: {} remote_io: {} failed: {}",
                report.attempted,
                report.transferred,
                report.remote_io,
                report.failures.len()
            ));
            Ok(lines.join("\n"))
        }
    }
}

pub(crate) fn format_classified(error: &TransferError, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => to_pretty_json(&json!({
            "code": error.code.code(),
            "error": error.code,
            "state": error.state,
            "message": error.message,
        })),
        OutputFormat::Table => Ok(format!(
            "code: {}\nstate: {}\nmessage: {}",
            error.code.code(),
            error.state.as_str(),
            error.message
        )),
    }
}

pub(crate) fn to_pretty_json<T: serde::Serialize + ?Sized>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))
}

const fn status_label(status: Option<TransferStatus>) -> &'static str {
    match status {
        Some(status) => status.tag(),
        None => "pending",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pilot_copytool::{ErrorCode, ErrorState, RecordFailure};
    use serde_json::Value;

    fn batch() -> (Vec<FileRecord>, BatchReport) {
        let mut done = FileRecord::new("mc16", "a.root");
        done.status = Some(TransferStatus::Transferred);
        done.turl = Some("davs://se/a.root".to_string());
        let mut failed = FileRecord::new("mc16", "b.root");
        failed.status = Some(TransferStatus::Failed {
            error: ErrorCode::StageInFailed,
        });
        let report = BatchReport {
            attempted: 2,
            transferred: 1,
            remote_io: 0,
            failures: vec![RecordFailure {
                did: failed.did(),
                error: TransferError::new(
                    ErrorCode::StageInFailed,
                    ErrorState::CopyError,
                    "replica not found",
                ),
            }],
        };
        (vec![done, failed, FileRecord::new("mc16", "c.root")], report)
    }

    #[test]
    fn table_lists_records_and_failures() -> CliResult<()> {
        let (files, report) = batch();
        let text = format_batch(&files, &report, OutputFormat::Table)?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[1].starts_with("mc16:a.root"));
        assert!(lines[1].contains("transferred"));
        assert!(lines[1].ends_with("davs://se/a.root"));
        assert!(lines[2].contains("1099"));
        assert!(lines[3].contains("pending"));
        assert_eq!(
            lines[4],
            "failed mc16:b.root: [1099 COPY_ERROR] replica not found"
        );
        assert_eq!(
            lines[5],
            "attempted: 2 transferred: 1 remote_io: 0 failed: 1"
        );
        Ok(())
    }

    #[test]
    fn json_carries_report_and_files() -> Result<(), Box<dyn std::error::Error>> {
        let (files, report) = batch();
        let text = format_batch(&files, &report, OutputFormat::Json)?;
        let value: Value = serde_json::from_str(&text)?;
        assert_eq!(value["report"]["attempted"], 2);
        assert_eq!(value["files"].as_array().map(Vec::len), Some(3));
        assert_eq!(value["files"][0]["status"]["tag"], "transferred");
        Ok(())
    }

    #[test]
    fn classified_error_renders_numeric_code_and_state() -> Result<(), Box<dyn std::error::Error>>
    {
        let error = TransferError::new(
            ErrorCode::RucioServiceUnavailable,
            ErrorState::CopyError,
            "service_unavailable",
        );
        let value: Value = serde_json::from_str(&format_classified(&error, OutputFormat::Json)?)?;
        assert_eq!(value["code"], 1219);
        assert_eq!(value["error"], "rucio_service_unavailable");
        assert_eq!(value["state"], "COPY_ERROR");
        assert_eq!(
            format_classified(&error, OutputFormat::Table)?,
            "code: 1219\nstate: COPY_ERROR\nmessage: service_unavailable"
        );
        Ok(())
    }
}
