//! Scripted stand-in for the rucio client.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;

use pilot_copytool::{CommandOutput, CommandRunner, CopytoolError, CopytoolResult, Invocation};

/// One scripted client run: files it leaves behind and the output it reports.
#[derive(Debug, Clone, Default)]
pub struct Step {
    output: CommandOutput,
    writes: Vec<(PathBuf, Vec<u8>)>,
}

impl Step {
    /// Run that exits zero with no output.
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    /// Run that exits with `exit_code` and prints `stderr`.
    #[must_use]
    pub fn failure(exit_code: i32, stderr: &str) -> Self {
        Self {
            output: CommandOutput {
                exit_code,
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
            writes: Vec::new(),
        }
    }

    /// Also write `contents` to `path` when the step runs.
    #[must_use]
    pub fn writing(mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.writes.push((path.into(), contents.into()));
        self
    }
}

/// [`CommandRunner`] replaying scripted steps in order and recording every invocation.
///
/// Runs beyond the script succeed silently.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    steps: RefCell<VecDeque<Step>>,
    calls: RefCell<Vec<Invocation>>,
}

impl ScriptedRunner {
    /// Runner replaying `steps`.
    #[must_use]
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: RefCell::new(steps.into_iter().collect()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Invocations received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Number of invocations received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> CopytoolResult<CommandOutput> {
        self.calls.borrow_mut().push(invocation.clone());
        let step = self.steps.borrow_mut().pop_front().unwrap_or_default();
        for (path, contents) in &step.writes {
            fs::write(path, contents).map_err(|source| CopytoolError::Io {
                operation: "scripted_runner.write",
                path: path.clone(),
                source,
            })?;
        }
        Ok(step.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;

    fn invocation() -> Invocation {
        Invocation {
            program: PathBuf::from("/usr/bin/env"),
            args: vec!["rucio".to_string()],
            envs: Vec::new(),
            cwd: None,
            timeout: Some(Duration::from_secs(1)),
        }
    }

    #[test]
    fn replays_steps_then_defaults_to_success() -> CopytoolResult<()> {
        let runner = ScriptedRunner::new([Step::failure(2, "Details: boom")]);
        let first = runner.run(&invocation())?;
        assert_eq!(first.exit_code, 2);
        assert_eq!(first.stderr, "Details: boom");
        assert!(runner.run(&invocation())?.success());
        assert_eq!(runner.call_count(), 2);
        Ok(())
    }

    #[test]
    fn step_writes_files() -> Result<(), Box<dyn std::error::Error>> {
        let dir = crate::fixtures::scratch_dir()?;
        let target = dir.path().join("payload.root");
        let runner = ScriptedRunner::new([Step::success().writing(&target, "payload")]);
        runner.run(&invocation())?;
        assert_eq!(fs::read_to_string(Path::new(&target))?, "payload");
        Ok(())
    }
}
