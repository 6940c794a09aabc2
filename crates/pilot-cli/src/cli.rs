//! Argument parsing and command dispatch for the copytool CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pilot_config::{ConfigLoader, CopytoolConfig, LogFormatSetting};
use pilot_copytool::RucioCopytool;
use pilot_telemetry::{CommandContextGuard, LogFormat, LoggingConfig, init_logging};

use crate::commands::classify::handle_classify;
use crate::commands::stage::{handle_stage_in, handle_stage_out};
use crate::error::{CliError, CliResult};

const BUILD_SHA: &str = match option_env!("PILOT_BUILD_SHA") {
    Some(sha) => sha,
    None => "dev",
};

/// Parses CLI arguments, executes the requested command, and reports the
/// outcome on stderr. Returns the process exit code.
#[must_use]
pub fn run() -> i32 {
    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

fn dispatch(cli: Cli) -> CliResult<()> {
    let config = ConfigLoader::new(cli.config).load()?;
    install_logging(&config)?;
    let _context = CommandContextGuard::new(cli.command.label());

    match cli.command {
        Command::StageIn(args) => {
            let copytool = RucioCopytool::new(config.rucio.clone());
            handle_stage_in(&copytool, &config, &args, cli.output)
        }
        Command::StageOut(args) => {
            let copytool = RucioCopytool::new(config.rucio.clone());
            handle_stage_out(&copytool, &config, &args, cli.output)
        }
        Command::Classify(args) => handle_classify(&args, cli.output),
    }
}

fn install_logging(config: &CopytoolConfig) -> CliResult<()> {
    let logging = LoggingConfig {
        level: &config.telemetry.level,
        format: LogFormat::from_name(config.telemetry.format.map(LogFormatSetting::as_str)),
        build_sha: BUILD_SHA,
    };
    init_logging(&logging).map_err(CliError::failure)
}

#[derive(Parser)]
#[command(
    name = "pilot-copytool",
    about = "Stage pilot job files in and out through the rucio client"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "PILOT_COPYTOOL_CONFIG",
        help = "JSON configuration document layered over the defaults"
    )]
    config: Option<PathBuf>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    output: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download input files into the working directory.
    StageIn(StageInArgs),
    /// Upload output files to their storage endpoint.
    StageOut(StageOutArgs),
    /// Classify rucio client diagnostics read from a file or stdin.
    Classify(ClassifyArgs),
}

impl Command {
    const fn label(&self) -> &'static str {
        match self {
            Self::StageIn(_) => "stage-in",
            Self::StageOut(_) => "stage-out",
            Self::Classify(_) => "classify",
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct StageInArgs {
    #[arg(long, help = "JSON document holding the file records")]
    pub(crate) files: PathBuf,
    #[arg(long, help = "Download directory for records without their own workdir")]
    pub(crate) workdir: Option<PathBuf>,
    #[arg(long, help = "Mark files readable in place as remote I/O instead of downloading")]
    pub(crate) allow_direct_access: bool,
    #[arg(long, help = "Attempt every file even after a failure")]
    pub(crate) ignore_errors: bool,
    #[arg(long, help = "Store updated records back into the input document")]
    pub(crate) write_back: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct StageOutArgs {
    #[arg(long, help = "JSON document holding the file records")]
    pub(crate) files: PathBuf,
    #[arg(long, help = "Summary directory for records without their own workdir")]
    pub(crate) workdir: Option<PathBuf>,
    #[arg(long, help = "Upload without registering the files in the catalog")]
    pub(crate) no_register: bool,
    #[arg(long, help = "Skip the upload summary and its checksum verification")]
    pub(crate) no_summary: bool,
    #[arg(long, help = "Attempt every file even after a failure")]
    pub(crate) ignore_errors: bool,
    #[arg(long, help = "Store updated records back into the input document")]
    pub(crate) write_back: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub(crate) struct ClassifyArgs {
    #[arg(long, help = "Classify as an upload failure instead of a download failure")]
    pub(crate) stage_out: bool,
    #[arg(long, help = "File holding the client output; stdin when omitted")]
    pub(crate) input: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Table,
    Json,
}
