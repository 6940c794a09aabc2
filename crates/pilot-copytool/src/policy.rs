//! Requirements the copytool declares to the surrounding pilot.

use crate::error::{CopytoolError, CopytoolResult};
use crate::model::FileRecord;

/// Input transfers need replicas resolved before `copy_in`.
pub const REQUIRE_REPLICAS: bool = true;
/// Output transfers do not need protocols resolved before `copy_out`.
pub const REQUIRE_PROTOCOLS: bool = false;

/// The copytool's declared requirements, as one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionPolicy {
    /// See [`REQUIRE_REPLICAS`].
    pub require_replicas: bool,
    /// See [`REQUIRE_PROTOCOLS`].
    pub require_protocols: bool,
}

impl DirectionPolicy {
    /// Policy of the rucio copytool.
    pub const DEFAULT: Self = Self {
        require_replicas: REQUIRE_REPLICAS,
        require_protocols: REQUIRE_PROTOCOLS,
    };
}

impl Default for DirectionPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Check that every record carries what a download needs.
///
/// # Errors
///
/// Returns [`CopytoolError::InvalidInput`] naming the first offending field.
pub fn check_copy_in(files: &[FileRecord]) -> CopytoolResult<()> {
    for record in files {
        require("scope", &record.scope, record)?;
        require("lfn", &record.lfn, record)?;
    }
    Ok(())
}

/// Check that every record carries what an upload needs.
///
/// # Errors
///
/// Returns [`CopytoolError::InvalidInput`] naming the first offending field.
pub fn check_copy_out(files: &[FileRecord]) -> CopytoolResult<()> {
    for record in files {
        require("lfn", &record.lfn, record)?;
        require("ddmendpoint", record.ddmendpoint.as_deref().unwrap_or(""), record)?;
        require("surl", record.surl.as_deref().unwrap_or(""), record)?;
    }
    Ok(())
}

fn require(field: &'static str, value: &str, record: &FileRecord) -> CopytoolResult<()> {
    if value.trim().is_empty() {
        return Err(CopytoolError::InvalidInput {
            field,
            reason: "missing",
            value: Some(record.did()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_constants() {
        let policy = DirectionPolicy::default();
        assert!(policy.require_replicas);
        assert!(!policy.require_protocols);
    }

    #[test]
    fn copy_in_requires_scope() {
        let files = vec![FileRecord::new("mc16", "a.root"), FileRecord::new("", "b.root")];
        let err = check_copy_in(&files).unwrap_err();
        assert!(matches!(
            err,
            CopytoolError::InvalidInput { field: "scope", value: Some(ref did), .. } if did == ":b.root"
        ));
    }

    #[test]
    fn copy_out_requires_endpoint_and_source() {
        let mut record = FileRecord::new("user.jdoe", "out.root");
        assert!(matches!(
            check_copy_out(std::slice::from_ref(&record)),
            Err(CopytoolError::InvalidInput {
                field: "ddmendpoint",
                ..
            })
        ));
        record.ddmendpoint = Some("CERN-PROD_SCRATCHDISK".to_string());
        assert!(matches!(
            check_copy_out(std::slice::from_ref(&record)),
            Err(CopytoolError::InvalidInput { field: "surl", .. })
        ));
        record.surl = Some("/work/out.root".to_string());
        assert!(check_copy_out(&[record]).is_ok());
    }
}
