//! Upload summary artifact written by `rucio upload --summary`.
//!
//! The artifact is a JSON object keyed by `scope:name`; each entry carries the
//! realized `pfn` and the digests the server computed, keyed by algorithm.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::checksum::ChecksumAlgorithm;
use crate::error::{CopytoolError, CopytoolResult};
use crate::model::FileRecord;

/// One uploaded file as reported by the client.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SummaryEntry {
    /// Realized physical transfer URL.
    #[serde(default)]
    pub pfn: Option<String>,
    /// Remaining fields, including digests keyed by algorithm name.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl SummaryEntry {
    /// Digest reported for `algorithm`, if any.
    #[must_use]
    pub fn digest(&self, algorithm: ChecksumAlgorithm) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| ChecksumAlgorithm::from_name(name) == Some(algorithm))
            .and_then(|(_, value)| value.as_str())
    }
}

/// A digest the record expects that differs from the one reported after upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestMismatch {
    /// Algorithm whose digests differ.
    pub algorithm: ChecksumAlgorithm,
    /// Digest the record carried.
    pub local: String,
    /// Digest the summary reported.
    pub remote: String,
}

impl DigestMismatch {
    /// First algorithm both sides carry whose digests disagree.
    #[must_use]
    pub fn find(record: &FileRecord, entry: &SummaryEntry) -> Option<Self> {
        [ChecksumAlgorithm::Adler32, ChecksumAlgorithm::Md5]
            .into_iter()
            .find_map(|algorithm| {
                let local = record.checksum_for(algorithm)?;
                let remote = entry.digest(algorithm)?;
                (!local.eq_ignore_ascii_case(remote)).then(|| Self {
                    algorithm,
                    local: local.to_string(),
                    remote: remote.to_string(),
                })
            })
    }
}

/// Parsed summary artifact.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct UploadSummary {
    entries: BTreeMap<String, SummaryEntry>,
}

impl UploadSummary {
    /// Read the artifact at `path`; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error when the file exists but cannot be read or parsed.
    pub fn read(path: &Path) -> CopytoolResult<Option<Self>> {
        let raw = match fs::read(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CopytoolError::io("read_summary", path, source)),
        };
        serde_json::from_slice(&raw)
            .map(Some)
            .map_err(|source| CopytoolError::json("parse_summary", path, source))
    }

    /// Entry for a record's `scope:name` key.
    #[must_use]
    pub fn entry_for(&self, record: &FileRecord) -> Option<&SummaryEntry> {
        self.entries.get(&record.did())
    }

    /// Number of entries in the artifact.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the artifact lists no files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    fn summary() -> Result<UploadSummary> {
        Ok(serde_json::from_value(json!({
            "scopeA:file1": { "pfn": "https://x/file1", "adler32": "deadbeef", "filesize": 12 },
            "scopeA:file2": { "md5": "00ff" }
        }))?)
    }

    #[test]
    fn entry_lookup_uses_did() -> Result<()> {
        let summary = summary()?;
        assert_eq!(summary.len(), 2);
        let record = FileRecord::new("scopeA", "file1");
        let entry = summary.entry_for(&record).expect("entry present");
        assert_eq!(entry.pfn.as_deref(), Some("https://x/file1"));
        assert_eq!(entry.digest(ChecksumAlgorithm::Adler32), Some("deadbeef"));
        assert_eq!(entry.digest(ChecksumAlgorithm::Md5), None);
        assert!(summary.entry_for(&FileRecord::new("scopeB", "file1")).is_none());
        Ok(())
    }

    #[test]
    fn mismatch_only_when_both_sides_carry_digest() -> Result<()> {
        let summary = summary()?;
        let mut record = FileRecord::new("scopeA", "file1");
        let entry = summary.entry_for(&record).expect("entry present").clone();
        assert!(DigestMismatch::find(&record, &entry).is_none());

        record
            .checksum
            .insert("adler32".to_string(), "deadbeef".to_string());
        assert!(DigestMismatch::find(&record, &entry).is_none());

        record
            .checksum
            .insert("adler32".to_string(), "cafef00d".to_string());
        let mismatch = DigestMismatch::find(&record, &entry).expect("mismatch");
        assert_eq!(mismatch.algorithm, ChecksumAlgorithm::Adler32);
        assert_eq!(mismatch.local, "cafef00d");
        assert_eq!(mismatch.remote, "deadbeef");
        Ok(())
    }

    #[test]
    fn read_distinguishes_missing_and_malformed() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("rucio_upload.json");
        assert!(UploadSummary::read(&path)?.is_none());

        fs::write(&path, "[1, 2")?;
        let err = UploadSummary::read(&path).unwrap_err();
        assert!(matches!(
            err,
            CopytoolError::Json {
                operation: "parse_summary",
                ..
            }
        ));
        Ok(())
    }
}
