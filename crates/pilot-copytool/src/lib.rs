#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(missing_docs, unreachable_pub)]
#![allow(clippy::module_name_repetitions)]

//! Rucio copytool: stages files in and out of a worker node through the
//! external `rucio` client and normalizes each outcome into a per-file status.
//!
//! Layout: `model/` (records, statuses, options), `classify.rs` (diagnostic
//! classification), `command.rs` (invocations and process execution),
//! `checksum.rs` (local integrity checks), `summary.rs` (upload summary
//! artifact), `policy.rs` (declared requirements), `service.rs` (batch
//! orchestration).

pub mod checksum;
pub mod classify;
pub mod command;
pub mod error;
pub mod model;
pub mod policy;
pub mod service;
pub mod summary;

pub use checksum::{
    CatalogChecksumVerifier, ChecksumAlgorithm, ChecksumVerdict, ChecksumVerifier,
    compute_file_checksum,
};
pub use classify::resolve_transfer_error;
pub use command::{
    CommandOutput, CommandRunner, Invocation, LOGGING_FORMAT_ENV, SystemCommandRunner,
    download_invocation, upload_invocation,
};
pub use error::{CopytoolError, CopytoolResult, ErrorCode, ErrorState, TransferError};
pub use model::{
    AccessMode, BatchReport, Direction, FileRecord, RecordFailure, Replica, StageInOptions,
    StageOutOptions, TransferStatus,
};
pub use policy::{DirectionPolicy, REQUIRE_PROTOCOLS, REQUIRE_REPLICAS, check_copy_in, check_copy_out};
pub use service::RucioCopytool;
pub use summary::{DigestMismatch, SummaryEntry, UploadSummary};
