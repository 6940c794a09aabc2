//! Rucio client invocations and the process-execution seam.
//!
//! # Design
//! - Invocations are plain data so tests can assert on the exact argument order.
//! - The log-format variable travels with each invocation instead of mutating the host env.
//! - [`CommandRunner`] is the only place a process is spawned.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use pilot_config::RucioSettings;

use crate::error::{CopytoolError, CopytoolResult};
use crate::model::{FileRecord, StageOutOptions};

/// Environment variable controlling the rucio client's log line format.
pub const LOGGING_FORMAT_ENV: &str = "RUCIO_LOGGING_FORMAT";

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A fully formed external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to execute.
    pub program: PathBuf,
    /// Arguments in order.
    pub args: Vec<String>,
    /// Extra environment variables for the child.
    pub envs: Vec<(String, String)>,
    /// Working directory for the child; inherits the host's when `None`.
    pub cwd: Option<PathBuf>,
    /// Wall-clock limit for the child.
    pub timeout: Option<Duration>,
}

impl Invocation {
    fn rucio(settings: &RucioSettings, subcommand: &str) -> Self {
        let mut args = vec![settings.client.clone()];
        if settings.verbose {
            args.push("-v".to_string());
        }
        args.push(subcommand.to_string());
        Self {
            program: settings.executable.clone(),
            args,
            envs: vec![(
                LOGGING_FORMAT_ENV.to_string(),
                settings.logging_format.clone(),
            )],
            cwd: None,
            timeout: settings.timeout(),
        }
    }

    fn arg(&mut self, value: impl Into<String>) -> &mut Self {
        self.args.push(value.into());
        self
    }

    /// Space-joined command line, for logs.
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Value of an environment variable set on this invocation.
    #[must_use]
    pub fn env(&self, name: &str) -> Option<&str> {
        self.envs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// `rucio download` of one record into `destination`.
///
/// With `pin_replica`, the download is restricted to the record's most
/// preferred replica endpoint when one is known.
#[must_use]
pub fn download_invocation(
    settings: &RucioSettings,
    record: &FileRecord,
    destination: &Path,
    pin_replica: bool,
) -> Invocation {
    let mut invocation = Invocation::rucio(settings, "download");
    invocation
        .arg("--no-subdir")
        .arg("--dir")
        .arg(destination.display().to_string());
    if pin_replica && let Some(replica) = record.replicas.first() {
        invocation.arg("--rse").arg(replica.endpoint.clone());
    }
    invocation.arg(record.did());
    invocation
}

/// `rucio upload` of one record, run from `workdir` so the summary lands there.
///
/// # Errors
///
/// Returns [`CopytoolError::InvalidInput`] when the record lacks its
/// destination endpoint or source location.
pub fn upload_invocation(
    settings: &RucioSettings,
    record: &FileRecord,
    options: &StageOutOptions,
    workdir: &Path,
) -> CopytoolResult<Invocation> {
    let endpoint = record
        .ddmendpoint
        .as_deref()
        .ok_or(CopytoolError::InvalidInput {
            field: "ddmendpoint",
            reason: "missing",
            value: Some(record.did()),
        })?;
    let source = record.surl.as_deref().ok_or(CopytoolError::InvalidInput {
        field: "surl",
        reason: "missing",
        value: Some(record.did()),
    })?;

    let mut invocation = Invocation::rucio(settings, "upload");
    invocation.arg("--rse").arg(endpoint);
    if !record.scope.is_empty() {
        invocation.arg("--scope").arg(record.scope.clone());
    }
    if let Some(guid) = &record.guid {
        invocation.arg("--guid").arg(guid.clone());
    }
    if options.no_register {
        invocation.arg("--no-register");
    }
    if options.summary {
        invocation.arg("--summary");
    }
    if let Some(turl) = &record.turl {
        invocation.arg("--pfn").arg(turl.clone());
    }
    invocation.arg(source);
    invocation.cwd = Some(workdir.to_path_buf());
    Ok(invocation)
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `-1` when the process was terminated by a signal.
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command exited with status zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Executes invocations on behalf of the copytool.
pub trait CommandRunner {
    /// Run `invocation` to completion and capture its output.
    ///
    /// # Errors
    ///
    /// Returns an error when the process cannot be started or exceeds its timeout.
    /// A nonzero exit is not an error.
    fn run(&self, invocation: &Invocation) -> CopytoolResult<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, invocation: &Invocation) -> CopytoolResult<CommandOutput> {
        (**self).run(invocation)
    }
}

/// [`CommandRunner`] spawning real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, invocation: &Invocation) -> CopytoolResult<CommandOutput> {
        let program = invocation.program.display().to_string();
        let spawn_error = |source| CopytoolError::Spawn {
            program: program.clone(),
            source,
        };

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .envs(invocation.envs.iter().map(|(key, value)| (key, value)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(spawn_error)?;
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = invocation.timeout.map(|limit| (limit, Instant::now() + limit));
        let status = loop {
            if let Some(status) = child.try_wait().map_err(spawn_error)? {
                break status;
            }
            if let Some((limit, at)) = deadline
                && Instant::now() >= at
            {
                // Best effort; the child may already have exited.
                let _ = child.kill();
                let _ = child.wait();
                return Err(CopytoolError::Timeout {
                    program: program.clone(),
                    seconds: limit.as_secs(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(CommandOutput {
            exit_code: status.code().unwrap_or(-1),
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }
}

fn drain<P>(pipe: Option<P>) -> Option<thread::JoinHandle<Vec<u8>>>
where
    P: Read + Send + 'static,
{
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = pipe.read_to_end(&mut buffer);
            buffer
        })
    })
}

fn collect(handle: Option<thread::JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Replica;

    fn settings() -> RucioSettings {
        RucioSettings::default()
    }

    #[test]
    fn download_pins_first_replica() {
        let record = FileRecord {
            replicas: vec![
                Replica {
                    endpoint: "CERN-PROD_DATADISK".to_string(),
                    pfn: None,
                },
                Replica {
                    endpoint: "BNL-OSG2_DATADISK".to_string(),
                    pfn: None,
                },
            ],
            ..FileRecord::new("mc16_13TeV", "EVNT.root.1")
        };
        let invocation = download_invocation(&settings(), &record, Path::new("/work"), true);
        assert_eq!(
            invocation.command_line(),
            "/usr/bin/env rucio -v download --no-subdir --dir /work --rse CERN-PROD_DATADISK mc16_13TeV:EVNT.root.1"
        );
        assert_eq!(
            invocation.env(LOGGING_FORMAT_ENV),
            Some("%(asctime)s %(levelname)s [%(message)s]")
        );
    }

    #[test]
    fn download_without_pin_omits_rse() {
        let record = FileRecord {
            replicas: vec![Replica {
                endpoint: "CERN-PROD_DATADISK".to_string(),
                pfn: None,
            }],
            ..FileRecord::new("mc16", "a.root")
        };
        let invocation = download_invocation(&settings(), &record, Path::new("."), false);
        assert!(!invocation.args.iter().any(|arg| arg == "--rse"));
        assert_eq!(invocation.args.last().map(String::as_str), Some("mc16:a.root"));
    }

    #[test]
    fn upload_includes_optional_flags_in_order() -> CopytoolResult<()> {
        let record = FileRecord {
            guid: Some("0F1E2D3C".to_string()),
            ddmendpoint: Some("CERN-PROD_SCRATCHDISK".to_string()),
            turl: Some("root://eos/out.root".to_string()),
            surl: Some("/work/out.root".to_string()),
            ..FileRecord::new("user.jdoe", "out.root")
        };
        let options = StageOutOptions {
            no_register: true,
            ..StageOutOptions::default()
        };
        let invocation = upload_invocation(&settings(), &record, &options, Path::new("/work"))?;
        assert_eq!(
            invocation.command_line(),
            "/usr/bin/env rucio -v upload --rse CERN-PROD_SCRATCHDISK --scope user.jdoe --guid 0F1E2D3C --no-register --summary --pfn root://eos/out.root /work/out.root"
        );
        assert_eq!(invocation.cwd.as_deref(), Some(Path::new("/work")));
        Ok(())
    }

    #[test]
    fn upload_requires_endpoint() {
        let record = FileRecord {
            surl: Some("/work/out.root".to_string()),
            ..FileRecord::new("user.jdoe", "out.root")
        };
        let err = upload_invocation(
            &settings(),
            &record,
            &StageOutOptions::default(),
            Path::new("."),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CopytoolError::InvalidInput {
                field: "ddmendpoint",
                ..
            }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_captures_streams_and_exit_code() -> CopytoolResult<()> {
        let invocation = Invocation {
            program: PathBuf::from("/bin/sh"),
            args: vec![
                "-c".to_string(),
                "echo out; echo \"$RUCIO_LOGGING_FORMAT\" >&2; exit 3".to_string(),
            ],
            envs: vec![(LOGGING_FORMAT_ENV.to_string(), "fmt".to_string())],
            cwd: None,
            timeout: Some(Duration::from_secs(10)),
        };
        let output = SystemCommandRunner.run(&invocation)?;
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "fmt");
        assert!(!output.success());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_enforces_timeout() {
        let invocation = Invocation {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".to_string(), "sleep 5".to_string()],
            envs: Vec::new(),
            cwd: None,
            timeout: Some(Duration::from_millis(200)),
        };
        let err = SystemCommandRunner.run(&invocation).unwrap_err();
        assert!(matches!(err, CopytoolError::Timeout { .. }));
    }

    #[test]
    fn system_runner_reports_missing_program() {
        let invocation = Invocation {
            program: PathBuf::from("/definitely/missing/rucio"),
            args: Vec::new(),
            envs: Vec::new(),
            cwd: None,
            timeout: None,
        };
        let err = SystemCommandRunner.run(&invocation).unwrap_err();
        assert!(matches!(err, CopytoolError::Spawn { .. }));
    }
}
