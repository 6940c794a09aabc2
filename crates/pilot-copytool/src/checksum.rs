//! Local checksum computation and catalog verification.
//!
//! # Design
//! - Verification is a seam ([`ChecksumVerifier`]) so hosts can plug in their own routine.
//! - The default verifier hashes the local file with the algorithm the record carries.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use md5::{Digest, Md5};
use tracing::{info, warn};

use crate::error::{CopytoolError, CopytoolResult, ErrorCode, ErrorState};
use crate::model::FileRecord;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChecksumAlgorithm {
    /// Adler-32, rendered as eight lowercase hex digits.
    Adler32,
    /// MD5, rendered as 32 lowercase hex digits.
    Md5,
}

impl ChecksumAlgorithm {
    /// Parse a checksum key as found in file records and upload summaries.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "adler32" | "ad32" => Some(Self::Adler32),
            "md5" => Some(Self::Md5),
            _ => None,
        }
    }

    /// Canonical key name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Adler32 => "adler32",
            Self::Md5 => "md5",
        }
    }

    /// State tag reported when a digest of this kind does not match.
    #[must_use]
    pub const fn mismatch_state(self) -> ErrorState {
        match self {
            Self::Adler32 => ErrorState::AdMismatch,
            Self::Md5 => ErrorState::Md5Mismatch,
        }
    }

    /// Error code for a mismatch after download.
    #[must_use]
    pub const fn get_mismatch_code(self) -> ErrorCode {
        match self {
            Self::Adler32 => ErrorCode::GetAdMismatch,
            Self::Md5 => ErrorCode::GetMd5Mismatch,
        }
    }

    /// Error code for a mismatch after upload.
    #[must_use]
    pub const fn put_mismatch_code(self) -> ErrorCode {
        match self {
            Self::Adler32 => ErrorCode::PutAdMismatch,
            Self::Md5 => ErrorCode::PutMd5Mismatch,
        }
    }
}

/// Outcome of comparing a local file with the catalog digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChecksumVerdict {
    /// Digests agree.
    Verified,
    /// Digests differ.
    Mismatch {
        /// Error code to record on the file.
        code: ErrorCode,
        /// State tag to report.
        state: ErrorState,
        /// Human-readable comparison.
        diagnostics: String,
    },
    /// Nothing to compare against.
    Skipped {
        /// Why verification did not run.
        reason: &'static str,
    },
}

/// Compares a downloaded file against the digest recorded in the catalog.
pub trait ChecksumVerifier {
    /// Verify the file at `path` against `record`'s expected checksum.
    ///
    /// # Errors
    ///
    /// Returns an error when the local file cannot be read.
    fn verify(&self, record: &FileRecord, path: &Path) -> CopytoolResult<ChecksumVerdict>;
}

/// Default verifier hashing the local file with Adler-32 or MD5.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogChecksumVerifier;

impl ChecksumVerifier for CatalogChecksumVerifier {
    fn verify(&self, record: &FileRecord, path: &Path) -> CopytoolResult<ChecksumVerdict> {
        let expected = [ChecksumAlgorithm::Adler32, ChecksumAlgorithm::Md5]
            .into_iter()
            .find_map(|algorithm| record.checksum_for(algorithm).map(|value| (algorithm, value)));
        let Some((algorithm, catalog)) = expected else {
            warn!(lfn = %record.lfn, "no catalog checksum to verify against");
            return Ok(ChecksumVerdict::Skipped {
                reason: "no_catalog_checksum",
            });
        };

        let local = compute_file_checksum(path, algorithm)?;
        if local.eq_ignore_ascii_case(catalog.trim()) {
            info!(lfn = %record.lfn, algorithm = algorithm.as_str(), "catalog and local checksum verified");
            return Ok(ChecksumVerdict::Verified);
        }

        Ok(ChecksumVerdict::Mismatch {
            code: algorithm.get_mismatch_code(),
            state: algorithm.mismatch_state(),
            diagnostics: format!(
                "checksum verification failed for LFN={}: checksum_catalog={catalog} != checksum_local={local}",
                record.lfn
            ),
        })
    }
}

/// Digest of the file at `path`, rendered as lowercase hex.
///
/// # Errors
///
/// Returns [`CopytoolError::Io`] when the file cannot be opened or read.
pub fn compute_file_checksum(path: &Path, algorithm: ChecksumAlgorithm) -> CopytoolResult<String> {
    let file = File::open(path).map_err(|source| CopytoolError::io("open_checksum", path, source))?;
    let mut reader = BufReader::new(file);
    let mut buffer = vec![0_u8; READ_BUFFER_SIZE];
    let mut adler = adler2::Adler32::new();
    let mut md5 = Md5::new();

    loop {
        let read = reader
            .read(&mut buffer)
            .map_err(|source| CopytoolError::io("read_checksum", path, source))?;
        if read == 0 {
            break;
        }
        match algorithm {
            ChecksumAlgorithm::Adler32 => adler.write_slice(&buffer[..read]),
            ChecksumAlgorithm::Md5 => md5.update(&buffer[..read]),
        }
    }

    Ok(match algorithm {
        ChecksumAlgorithm::Adler32 => format!("{:08x}", adler.checksum()),
        ChecksumAlgorithm::Md5 => format!("{:x}", md5.finalize()),
    })
}
