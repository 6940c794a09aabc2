//! Batch orchestration for stage-in and stage-out.
//!
//! # Design
//! - Records are processed strictly in order; the first non-ignorable failure ends the batch.
//! - With ignore-errors every record is attempted and failures land in the [`BatchReport`].
//! - Already transferred records are never rolled back.

use std::error::Error as _;
use std::path::Path;

use pilot_config::RucioSettings;
use tracing::{error, info, info_span, warn};

use crate::checksum::{
    CatalogChecksumVerifier, ChecksumAlgorithm, ChecksumVerdict, ChecksumVerifier,
};
use crate::classify::resolve_transfer_error;
use crate::command::{
    CommandOutput, CommandRunner, Invocation, SystemCommandRunner, download_invocation,
    upload_invocation,
};
use crate::error::{CopytoolError, CopytoolResult, ErrorCode, ErrorState, TransferError};
use crate::model::{
    BatchReport, Direction, FileRecord, RecordFailure, StageInOptions, StageOutOptions,
    TransferStatus,
};
use crate::policy::DirectionPolicy;
use crate::summary::{DigestMismatch, UploadSummary};

/// Rucio-backed copytool.
#[derive(Debug, Clone)]
pub struct RucioCopytool<R = SystemCommandRunner, V = CatalogChecksumVerifier> {
    settings: RucioSettings,
    policy: DirectionPolicy,
    runner: R,
    verifier: V,
}

impl RucioCopytool {
    /// Copytool spawning real client processes and hashing files locally.
    #[must_use]
    pub fn new(settings: RucioSettings) -> Self {
        Self::with_collaborators(settings, SystemCommandRunner, CatalogChecksumVerifier)
    }
}

impl<R, V> RucioCopytool<R, V>
where
    R: CommandRunner,
    V: ChecksumVerifier,
{
    /// Copytool with injected process and checksum collaborators.
    #[must_use]
    pub const fn with_collaborators(settings: RucioSettings, runner: R, verifier: V) -> Self {
        Self {
            settings,
            policy: DirectionPolicy::DEFAULT,
            runner,
            verifier,
        }
    }

    /// Client settings in use.
    #[must_use]
    pub const fn settings(&self) -> &RucioSettings {
        &self.settings
    }

    /// Requirements declared to the pilot.
    #[must_use]
    pub const fn policy(&self) -> DirectionPolicy {
        self.policy
    }

    /// Download `files`, updating each record's status in place.
    ///
    /// # Errors
    ///
    /// Returns [`CopytoolError::Transfer`] for the first failure when
    /// `ignore_errors` is unset; records after it are left untouched. A local
    /// file that cannot be read for verification fails its record like a
    /// checksum mismatch.
    pub fn copy_in(
        &self,
        files: &mut [FileRecord],
        options: &StageInOptions,
    ) -> CopytoolResult<BatchReport> {
        let _span = info_span!("copy_in", files = files.len()).entered();
        let mut report = BatchReport::default();

        for record in files.iter_mut() {
            if options.allow_direct_access && record.is_direct_access(false) {
                info!(did = %record.did(), "file will be read directly; skipping download");
                record.status = Some(TransferStatus::RemoteIo);
                report.remote_io += 1;
                continue;
            }

            record.status = None;
            let destination = record
                .effective_workdir(options.workdir.as_deref())
                .to_path_buf();
            let invocation = download_invocation(
                &self.settings,
                record,
                &destination,
                self.policy.require_replicas,
            );
            let output = self.execute(record, &invocation, Direction::Inbound);
            report.attempted += 1;

            let mut failure = None;
            if !output.success() {
                let classified = resolve_transfer_error(&output.stderr, Direction::Inbound)?;
                failure = Some(Self::record_failure(record, classified, options.ignore_errors)?);
            }

            let local = destination.join(&record.lfn);
            if local.exists() {
                let verified = match self.verifier.verify(record, &local) {
                    Ok(ChecksumVerdict::Mismatch {
                        code,
                        state,
                        diagnostics,
                    }) => Some(TransferError::new(code, state, diagnostics)),
                    Ok(ChecksumVerdict::Verified | ChecksumVerdict::Skipped { .. }) => None,
                    Err(err) => {
                        error!(
                            did = %record.did(),
                            path = %local.display(),
                            error = %err,
                            "failed to verify downloaded file"
                        );
                        Some(TransferError::new(
                            ErrorCode::StageInFailed,
                            ErrorState::CopyError,
                            format!("Failed to verify downloaded file: {}", describe(&err)),
                        ))
                    }
                };
                if let Some(verification) = verified {
                    failure = Some(Self::record_failure(
                        record,
                        verification,
                        options.ignore_errors,
                    )?);
                }
            } else {
                warn!(path = %local.display(), "downloaded file not found at expected path");
            }

            Self::settle(record, failure, &mut report);
        }

        info!(
            attempted = report.attempted,
            transferred = report.transferred,
            remote_io = report.remote_io,
            failed = report.failures.len(),
            "stage-in finished"
        );
        Ok(report)
    }

    /// Upload `files`, updating each record's status (and realized `turl`) in place.
    ///
    /// # Errors
    ///
    /// Returns [`CopytoolError::Transfer`] for the first failure when
    /// `ignore_errors` is unset; a record lacking its endpoint or source
    /// location counts as such a failure. An unreadable summary artifact
    /// aborts the batch regardless.
    pub fn copy_out(
        &self,
        files: &mut [FileRecord],
        options: &StageOutOptions,
    ) -> CopytoolResult<BatchReport> {
        let _span = info_span!("copy_out", files = files.len()).entered();
        let mut report = BatchReport::default();

        for record in files.iter_mut() {
            let workdir = record
                .effective_workdir(options.workdir.as_deref())
                .to_path_buf();
            record.status = None;
            let invocation = match upload_invocation(&self.settings, record, options, &workdir) {
                Ok(invocation) => invocation,
                Err(err) => {
                    let reason = match &err {
                        CopytoolError::InvalidInput { field, reason, .. } => {
                            format!("{field} {reason}")
                        }
                        other => describe(other),
                    };
                    let rejected = TransferError::new(
                        ErrorCode::StageOutFailed,
                        ErrorState::CopyError,
                        format!("Failed to stageout {}: {reason}", record.did()),
                    );
                    let failure = Self::record_failure(record, rejected, options.ignore_errors)?;
                    Self::settle(record, Some(failure), &mut report);
                    continue;
                }
            };
            let output = self.execute(record, &invocation, Direction::Outbound);
            report.attempted += 1;

            let mut failure = None;
            if !output.success() {
                let classified = resolve_transfer_error(&output.stderr, Direction::Outbound)?;
                failure = Some(Self::record_failure(record, classified, options.ignore_errors)?);
            }

            if options.summary
                && let Some(mismatch) = self.reconcile_summary(record, &workdir)?
            {
                failure = Some(Self::record_failure(record, mismatch, options.ignore_errors)?);
            }

            Self::settle(record, failure, &mut report);
        }

        info!(
            attempted = report.attempted,
            transferred = report.transferred,
            failed = report.failures.len(),
            "stage-out finished"
        );
        Ok(report)
    }

    fn execute(
        &self,
        record: &FileRecord,
        invocation: &Invocation,
        direction: Direction,
    ) -> CommandOutput {
        let command = invocation.command_line();
        info!(did = %record.did(), command = %command, "executing rucio client");
        let output = match self.runner.run(invocation) {
            Ok(output) => output,
            Err(err) => {
                error!(
                    did = %record.did(),
                    error = %err,
                    stagein = direction.is_stagein(),
                    "rucio client did not complete"
                );
                CommandOutput {
                    exit_code: -1,
                    stdout: String::new(),
                    stderr: describe(&err),
                }
            }
        };
        info!(exit_code = output.exit_code, stdout = %output.stdout, "rucio stdout");
        info!(exit_code = output.exit_code, stderr = %output.stderr, "rucio stderr");
        output
    }

    fn reconcile_summary(
        &self,
        record: &mut FileRecord,
        workdir: &Path,
    ) -> CopytoolResult<Option<TransferError>> {
        let path = workdir.join(&self.settings.summary_file);
        let Some(summary) = UploadSummary::read(&path)? else {
            error!(
                path = %path.display(),
                "failed to resolve rucio summary json, wrong path?"
            );
            return Ok(None);
        };
        let Some(entry) = summary.entry_for(record) else {
            warn!(did = %record.did(), path = %path.display(), "upload summary has no entry for file");
            return Ok(None);
        };

        if let Some(pfn) = &entry.pfn {
            record.turl = Some(pfn.clone());
        }

        Ok(DigestMismatch::find(record, entry).map(|mismatch| {
            warn!(
                did = %record.did(),
                algorithm = mismatch.algorithm.as_str(),
                local = %mismatch.local,
                remote = %mismatch.remote,
                "checksum verification failed: local != remote"
            );
            let message = match mismatch.algorithm {
                ChecksumAlgorithm::Adler32 => "Failed to stageout: CRC mismatched",
                ChecksumAlgorithm::Md5 => "Failed to stageout: MD5 mismatched",
            };
            TransferError::new(
                mismatch.algorithm.put_mismatch_code(),
                mismatch.algorithm.mismatch_state(),
                message,
            )
        }))
    }

    fn record_failure(
        record: &mut FileRecord,
        error: TransferError,
        ignore_errors: bool,
    ) -> CopytoolResult<TransferError> {
        warn!(
            did = %record.did(),
            code = error.code.code(),
            state = error.state.as_str(),
            message = %error.message,
            ignored = ignore_errors,
            "transfer failed"
        );
        record.status = Some(TransferStatus::Failed { error: error.code });
        if ignore_errors {
            Ok(error)
        } else {
            Err(CopytoolError::Transfer(error))
        }
    }

    fn settle(record: &mut FileRecord, failure: Option<TransferError>, report: &mut BatchReport) {
        match failure {
            Some(error) => report.failures.push(RecordFailure {
                did: record.did(),
                error,
            }),
            None => {
                record.status = Some(TransferStatus::Transferred);
                report.transferred += 1;
            }
        }
    }
}

fn describe(err: &CopytoolError) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
