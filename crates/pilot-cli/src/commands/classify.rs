//! Offline classification of captured client output.

use std::fs;
use std::io::{self, Read};

use anyhow::Context;
use pilot_copytool::{Direction, resolve_transfer_error};

use crate::cli::{ClassifyArgs, OutputFormat};
use crate::error::{CliError, CliResult};
use crate::output::format_classified;

pub(crate) fn handle_classify(args: &ClassifyArgs, format: OutputFormat) -> CliResult<()> {
    let text = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))
            .map_err(CliError::failure)?,
        None => read_stdin()?,
    };
    println!("{}", classify_text(&text, args.stage_out, format)?);
    Ok(())
}

pub(crate) fn classify_text(text: &str, stage_out: bool, format: OutputFormat) -> CliResult<String> {
    let direction = if stage_out {
        Direction::Outbound
    } else {
        Direction::Inbound
    };
    format_classified(&resolve_transfer_error(text, direction)?, format)
}

fn read_stdin() -> CliResult<String> {
    let mut text = String::new();
    io::stdin()
        .read_to_string(&mut text)
        .context("failed to read stdin")
        .map_err(CliError::failure)?;
    Ok(text)
}
