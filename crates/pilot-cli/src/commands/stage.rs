//! Stage-in and stage-out handlers over a JSON document of file records.

use std::fs;
use std::path::Path;

use anyhow::Context;
use pilot_config::CopytoolConfig;
use pilot_copytool::{
    BatchReport, ChecksumVerifier, CommandRunner, CopytoolResult, FileRecord, RucioCopytool,
    StageInOptions, StageOutOptions, check_copy_in, check_copy_out,
};
use tracing::warn;

use crate::cli::{OutputFormat, StageInArgs, StageOutArgs};
use crate::error::{CliError, CliResult};
use crate::output::{format_batch, to_pretty_json};

pub(crate) fn handle_stage_in<R, V>(
    copytool: &RucioCopytool<R, V>,
    config: &CopytoolConfig,
    args: &StageInArgs,
    format: OutputFormat,
) -> CliResult<()>
where
    R: CommandRunner,
    V: ChecksumVerifier,
{
    println!("{}", stage_in(copytool, config, args, format)?);
    Ok(())
}

pub(crate) fn handle_stage_out<R, V>(
    copytool: &RucioCopytool<R, V>,
    config: &CopytoolConfig,
    args: &StageOutArgs,
    format: OutputFormat,
) -> CliResult<()>
where
    R: CommandRunner,
    V: ChecksumVerifier,
{
    println!("{}", stage_out(copytool, config, args, format)?);
    Ok(())
}

fn stage_in<R, V>(
    copytool: &RucioCopytool<R, V>,
    config: &CopytoolConfig,
    args: &StageInArgs,
    format: OutputFormat,
) -> CliResult<String>
where
    R: CommandRunner,
    V: ChecksumVerifier,
{
    let mut files = load_records(&args.files)?;
    check_copy_in(&files)?;
    let options = StageInOptions {
        workdir: args.workdir.clone().or_else(|| config.workdir.clone()),
        allow_direct_access: args.allow_direct_access,
        ignore_errors: args.ignore_errors,
    };
    let outcome = copytool.copy_in(&mut files, &options);
    finish(&files, outcome, &args.files, args.write_back, format)
}

fn stage_out<R, V>(
    copytool: &RucioCopytool<R, V>,
    config: &CopytoolConfig,
    args: &StageOutArgs,
    format: OutputFormat,
) -> CliResult<String>
where
    R: CommandRunner,
    V: ChecksumVerifier,
{
    let mut files = load_records(&args.files)?;
    check_copy_out(&files)?;
    let options = StageOutOptions {
        workdir: args.workdir.clone().or_else(|| config.workdir.clone()),
        no_register: args.no_register,
        summary: !args.no_summary,
        ignore_errors: args.ignore_errors,
    };
    let outcome = copytool.copy_out(&mut files, &options);
    finish(&files, outcome, &args.files, args.write_back, format)
}

fn finish(
    files: &[FileRecord],
    outcome: CopytoolResult<BatchReport>,
    document: &Path,
    write_back: bool,
    format: OutputFormat,
) -> CliResult<String> {
    // Statuses set before an abort are persisted too.
    if write_back {
        store_records(document, files)?;
    }
    let report = outcome?;
    if !report.is_clean() {
        warn!(
            failed = report.failures.len(),
            "batch finished with ignored failures"
        );
    }
    format_batch(files, &report, format)
}

fn load_records(path: &Path) -> CliResult<Vec<FileRecord>> {
    let raw = fs::read(path)
        .with_context(|| format!("failed to read file records from {}", path.display()))
        .map_err(CliError::failure)?;
    serde_json::from_slice(&raw).map_err(|err| {
        CliError::validation(format!(
            "failed to parse file records in {}: {err}",
            path.display()
        ))
    })
}

fn store_records(path: &Path, files: &[FileRecord]) -> CliResult<()> {
    let text = to_pretty_json(files)?;
    fs::write(path, text)
        .with_context(|| format!("failed to write file records to {}", path.display()))
        .map_err(CliError::failure)
}
