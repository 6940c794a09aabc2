//! Test fixtures: scratch directories, file records, and summary artifacts.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use pilot_copytool::FileRecord;
use serde_json::Value;
use tempfile::TempDir;

/// File name the rucio client uses for its upload summary.
pub const SUMMARY_FILE: &str = "rucio_upload.json";

/// Fresh scratch directory removed on drop.
///
/// # Errors
///
/// Returns an error when the directory cannot be created.
pub fn scratch_dir() -> io::Result<TempDir> {
    tempfile::Builder::new().prefix("pilot-copytool-").tempdir()
}

/// Record ready for download into `workdir`.
#[must_use]
pub fn download_record(scope: &str, lfn: &str, workdir: &Path) -> FileRecord {
    FileRecord {
        workdir: Some(workdir.to_path_buf()),
        ..FileRecord::new(scope, lfn)
    }
}

/// Record ready for upload from `workdir` to `endpoint`.
#[must_use]
pub fn upload_record(scope: &str, lfn: &str, endpoint: &str, workdir: &Path) -> FileRecord {
    FileRecord {
        ddmendpoint: Some(endpoint.to_string()),
        surl: Some(workdir.join(lfn).display().to_string()),
        workdir: Some(workdir.to_path_buf()),
        ..FileRecord::new(scope, lfn)
    }
}

/// Attach an expected Adler-32 digest to a record.
#[must_use]
pub fn with_adler32(mut record: FileRecord, digest: &str) -> FileRecord {
    record
        .checksum
        .insert("adler32".to_string(), digest.to_string());
    record
}

/// Write an upload summary artifact into `dir`.
///
/// # Errors
///
/// Returns an error when the artifact cannot be written.
pub fn write_summary(dir: &Path, summary: &Value) -> io::Result<PathBuf> {
    let path = dir.join(SUMMARY_FILE);
    fs::write(&path, summary.to_string())?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upload_record_points_source_into_workdir() -> io::Result<()> {
        let dir = scratch_dir()?;
        let record = upload_record("user.jdoe", "out.root", "CERN-PROD_SCRATCHDISK", dir.path());
        assert_eq!(
            record.surl.as_deref(),
            Some(dir.path().join("out.root").display().to_string().as_str())
        );
        assert_eq!(record.ddmendpoint.as_deref(), Some("CERN-PROD_SCRATCHDISK"));
        Ok(())
    }

    #[test]
    fn write_summary_creates_artifact() -> io::Result<()> {
        let dir = scratch_dir()?;
        let path = write_summary(dir.path(), &json!({ "a:b": { "pfn": "root://x/b" } }))?;
        assert!(path.ends_with(SUMMARY_FILE));
        assert!(fs::read_to_string(path)?.contains("root://x/b"));
        Ok(())
    }
}
