//! Domain models for the copytool.
//!
//! # Design
//! - File records are owned by the caller; the copytool only writes `status` and `turl`.
//! - Status is a tagged enum so a success code can never sit next to a `failed` tag.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::checksum::ChecksumAlgorithm;
use crate::error::{ErrorCode, TransferError};

const ARCHIVE_MARKERS: &[&str] = &[".tar.gz", ".lib.tgz", ".raw."];
const DIRECT_ACCESS_SCHEMES: &[&str] = &["root://", "dcache://", "dcap://", "file://", "https://"];

/// Transfer direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Download onto the worker node (stage-in).
    Inbound,
    /// Upload from the worker node (stage-out).
    Outbound,
}

impl Direction {
    /// Whether this is a stage-in transfer.
    #[must_use]
    pub const fn is_stagein(self) -> bool {
        matches!(self, Self::Inbound)
    }

    /// Generic failure code for the direction.
    #[must_use]
    pub const fn failure_code(self) -> ErrorCode {
        match self {
            Self::Inbound => ErrorCode::StageInFailed,
            Self::Outbound => ErrorCode::StageOutFailed,
        }
    }
}

/// How a file may be read by the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Read in place from remote storage.
    Direct,
    /// Copy to the worker node first.
    Copy,
}

/// A known physical copy of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replica {
    /// Storage endpoint (RSE) holding the copy.
    pub endpoint: String,
    /// Physical file name at that endpoint, when resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pfn: Option<String>,
}

/// Final per-file transfer status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "snake_case")]
pub enum TransferStatus {
    /// The file is read directly from remote storage; nothing was copied.
    RemoteIo,
    /// The file was copied successfully.
    Transferred,
    /// The transfer or its verification failed.
    Failed {
        /// Pilot error code describing the failure.
        error: ErrorCode,
    },
}

impl TransferStatus {
    /// Numeric status code: zero for success, the pilot error code otherwise.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::RemoteIo | Self::Transferred => 0,
            Self::Failed { error } => error.code(),
        }
    }

    /// Status tag as reported to the pilot.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::RemoteIo => "remote_io",
            Self::Transferred => "transferred",
            Self::Failed { .. } => "failed",
        }
    }

    /// Whether the status records a failure.
    #[must_use]
    pub const fn is_failed(self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Description of one file to stage in or out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Catalog scope.
    pub scope: String,
    /// Logical file name.
    pub lfn: String,
    /// Globally unique identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<String>,
    /// Candidate replicas, most preferred first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replicas: Vec<Replica>,
    /// Destination storage endpoint for uploads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ddmendpoint: Option<String>,
    /// Fixed or realized physical transfer URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turl: Option<String>,
    /// Source location of an output file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surl: Option<String>,
    /// Working directory of the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<PathBuf>,
    /// Expected digests keyed by algorithm name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub checksum: BTreeMap<String, String>,
    /// Requested access mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessmode: Option<AccessMode>,
    /// Outcome of the last transfer attempt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TransferStatus>,
}

impl FileRecord {
    /// Record for `scope:lfn` with every optional field unset.
    #[must_use]
    pub fn new(scope: impl Into<String>, lfn: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            lfn: lfn.into(),
            guid: None,
            replicas: Vec::new(),
            ddmendpoint: None,
            turl: None,
            surl: None,
            workdir: None,
            checksum: BTreeMap::new(),
            accessmode: None,
            status: None,
        }
    }

    /// Data identifier in rucio's `scope:name` form.
    #[must_use]
    pub fn did(&self) -> String {
        format!("{}:{}", self.scope, self.lfn)
    }

    /// Status code of the last attempt, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<i32> {
        self.status.map(TransferStatus::code)
    }

    /// Whether the last attempt failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status.is_some_and(TransferStatus::is_failed)
    }

    /// Working directory, falling back to the batch default and then `.`.
    #[must_use]
    pub fn effective_workdir<'a>(&'a self, default: Option<&'a Path>) -> &'a Path {
        self.workdir
            .as_deref()
            .or(default)
            .unwrap_or_else(|| Path::new("."))
    }

    /// Expected digest for an algorithm, accepting legacy key aliases.
    #[must_use]
    pub fn checksum_for(&self, algorithm: ChecksumAlgorithm) -> Option<&str> {
        self.checksum
            .iter()
            .find(|(name, _)| ChecksumAlgorithm::from_name(name) == Some(algorithm))
            .map(|(_, digest)| digest.as_str())
    }

    /// Whether the payload may read this file in place.
    ///
    /// Archives are never read directly. With `ensure_replica`, the record must
    /// also carry a transfer URL with a protocol the payload can open.
    #[must_use]
    pub fn is_direct_access(&self, ensure_replica: bool) -> bool {
        let name = self.lfn.to_lowercase();
        let is_archive = name.starts_with("raw.")
            || ARCHIVE_MARKERS.iter().any(|marker| name.contains(marker));
        if is_archive {
            return false;
        }

        let direct = self.accessmode == Some(AccessMode::Direct);
        if !ensure_replica {
            return direct;
        }
        direct
            && self.turl.as_deref().is_some_and(|turl| {
                DIRECT_ACCESS_SCHEMES
                    .iter()
                    .any(|scheme| turl.starts_with(scheme))
            })
    }
}

/// Options for a stage-in batch.
#[derive(Debug, Clone, Default)]
pub struct StageInOptions {
    /// Destination directory for records without their own workdir.
    pub workdir: Option<PathBuf>,
    /// Permit direct remote access in place of a download.
    pub allow_direct_access: bool,
    /// Record failures per file instead of aborting the batch.
    pub ignore_errors: bool,
}

/// Options for a stage-out batch.
#[derive(Debug, Clone)]
pub struct StageOutOptions {
    /// Directory holding the summary artifact for records without their own workdir.
    pub workdir: Option<PathBuf>,
    /// Ask the client not to register uploads in the catalog.
    pub no_register: bool,
    /// Ask the client for a machine-readable summary and verify against it.
    pub summary: bool,
    /// Record failures per file instead of aborting the batch.
    pub ignore_errors: bool,
}

impl Default for StageOutOptions {
    fn default() -> Self {
        Self {
            workdir: None,
            no_register: false,
            summary: true,
            ignore_errors: false,
        }
    }
}

/// Failure recorded for one file of a batch run with ignore-errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    /// Data identifier of the file.
    pub did: String,
    /// Classified failure.
    pub error: TransferError,
}

/// Aggregate outcome of a batch that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Files for which a transfer command was issued.
    pub attempted: usize,
    /// Files that ended as `transferred`.
    pub transferred: usize,
    /// Files that ended as `remote_io`.
    pub remote_io: usize,
    /// Failures that were ignored, in batch order.
    pub failures: Vec<RecordFailure>,
}

impl BatchReport {
    /// Whether every file succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(lfn: &str) -> FileRecord {
        FileRecord {
            accessmode: Some(AccessMode::Direct),
            ..FileRecord::new("mc16", lfn)
        }
    }

    #[test]
    fn status_code_and_tag_agree() {
        assert_eq!(TransferStatus::RemoteIo.code(), 0);
        assert_eq!(TransferStatus::Transferred.tag(), "transferred");
        let failed = TransferStatus::Failed {
            error: ErrorCode::StageInFailed,
        };
        assert_eq!(failed.code(), 1099);
        assert_eq!(failed.tag(), "failed");
    }

    #[test]
    fn direct_access_excludes_archives() {
        assert!(record("EVNT.01234._000001.pool.root.1").is_direct_access(false));
        assert!(!record("user.lib.tgz").is_direct_access(false));
        assert!(!record("data.raw.0001").is_direct_access(false));
        assert!(!record("RAW.0001").is_direct_access(false));
        assert!(!record("bundle.tar.gz").is_direct_access(false));
    }

    #[test]
    fn direct_access_requires_direct_mode() {
        let mut copy = record("AOD.pool.root");
        copy.accessmode = Some(AccessMode::Copy);
        assert!(!copy.is_direct_access(false));
        copy.accessmode = None;
        assert!(!copy.is_direct_access(false));
    }

    #[test]
    fn direct_access_with_replica_checks_turl_scheme() {
        let mut direct = record("AOD.pool.root");
        assert!(!direct.is_direct_access(true));
        direct.turl = Some("srm://se.example/AOD.pool.root".to_string());
        assert!(!direct.is_direct_access(true));
        direct.turl = Some("root://se.example//AOD.pool.root".to_string());
        assert!(direct.is_direct_access(true));
    }

    #[test]
    fn checksum_lookup_accepts_legacy_alias() {
        let mut file = FileRecord::new("mc16", "a.root");
        file.checksum.insert("ad32".to_string(), "0a0b0c0d".to_string());
        assert_eq!(file.checksum_for(ChecksumAlgorithm::Adler32), Some("0a0b0c0d"));
        assert_eq!(file.checksum_for(ChecksumAlgorithm::Md5), None);
    }

    #[test]
    fn workdir_falls_back_to_batch_default_then_cwd() {
        let mut file = FileRecord::new("mc16", "a.root");
        assert_eq!(file.effective_workdir(None), Path::new("."));
        assert_eq!(
            file.effective_workdir(Some(Path::new("/batch"))),
            Path::new("/batch")
        );
        file.workdir = Some(PathBuf::from("/own"));
        assert_eq!(
            file.effective_workdir(Some(Path::new("/batch"))),
            Path::new("/own")
        );
    }

    #[test]
    fn record_serializes_status_with_tag() {
        let mut file = FileRecord::new("mc16", "a.root");
        file.status = Some(TransferStatus::Failed {
            error: ErrorCode::StageOutFailed,
        });
        let value = serde_json::to_value(&file).expect("serialize");
        assert_eq!(
            value["status"],
            serde_json::json!({ "tag": "failed", "error": "stage_out_failed" })
        );
        let parsed: FileRecord = serde_json::from_value(value).expect("deserialize");
        assert_eq!(parsed, file);
    }
}
