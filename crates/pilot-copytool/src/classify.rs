//! Classification of rucio client diagnostics into pilot errors.
//!
//! The client's stderr is unstructured, so classification is an ordered rule
//! list applied line by line. Rule order matters: once a line reports the
//! service as unavailable, that verdict sticks for the rest of the text,
//! while `Details:` lines only ever replace the message and the last one wins.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CopytoolError, CopytoolResult, ErrorCode, ErrorState, TransferError};
use crate::model::Direction;

const SERVICE_UNAVAILABLE_MARKER: &str = "service_unavailable";
const DETAILS_PATTERN: &str = r"Details\s*:\s*(?P<error>.*)";

static DETAILS_REGEX: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(DETAILS_PATTERN));

/// Map the client's diagnostic output to a structured error.
///
/// When no rule matches, the direction's generic failure code is used with a
/// message embedding the raw output.
///
/// # Errors
///
/// Returns [`CopytoolError::RegexCompile`] if a classification pattern does
/// not compile.
pub fn resolve_transfer_error(output: &str, direction: Direction) -> CopytoolResult<TransferError> {
    let details = DETAILS_REGEX
        .as_ref()
        .map_err(|source| CopytoolError::RegexCompile {
            pattern: DETAILS_PATTERN,
            source: source.clone(),
        })?;
    let mut resolved = TransferError::new(
        direction.failure_code(),
        ErrorState::CopyError,
        format!(
            "Copy operation failed [is_stagein={}]: {output}",
            direction.is_stagein()
        ),
    );
    let mut service_unavailable = false;

    for line in output.lines() {
        if line.contains(SERVICE_UNAVAILABLE_MARKER) {
            service_unavailable = true;
            resolved.code = ErrorCode::RucioServiceUnavailable;
            resolved.message = SERVICE_UNAVAILABLE_MARKER.to_string();
        } else if !service_unavailable
            && let Some(found) = details.captures(line).and_then(|caps| caps.name("error"))
        {
            resolved.message = found.as_str().to_string();
        }
    }

    Ok(resolved)
}
