use crate::input::Input;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Signal number for a segmentation violation, the one fault the campaign
/// archives.
pub const SIGSEGV: i32 = 11;

/// Outcome of one target execution, mapped from the process exit status.
///
/// A closed enum so that classification in the campaign loop is exhaustive
/// and checked at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Clean exit with status 0.
    Success,
    /// Exit with a non-zero status code. Typically a robust target rejecting
    /// malformed input, not a bug.
    NonZeroExit(i32),
    /// Terminated by a signal (unix). Carries the signal number.
    Signaled(i32),
}

/// Errors from driving the target process.
///
/// A spawn failure at campaign startup is fatal; the same failure appearing
/// transiently mid-run is logged by the worker and the iteration is skipped.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The target command was configured with no executable.
    #[error("target command is empty")]
    EmptyCommand,

    /// The candidate could not be written to the runner's scratch file.
    #[error("failed to write candidate input to {0:?}: {1}")]
    InputWrite(PathBuf, String),

    /// The target executable could not be spawned.
    #[error("failed to spawn target {0:?}: {1}")]
    Spawn(String, String),

    /// Waiting on the spawned target failed.
    #[error("failed waiting for target {0:?}: {1}")]
    Wait(String, String),
}

/// Invokes the external target on candidate inputs and classifies the
/// outcome.
///
/// Each runner owns a scratch input file created at construction, so
/// concurrent workers never clobber each other's in-flight input. The file
/// handle is held for the runner's lifetime and rewritten in place before
/// every run.
///
/// `run` blocks for the full lifetime of the target process. A hung target
/// therefore stalls exactly one worker; bounding target runtime is left to
/// an external timeout wrapper around the target command.
#[derive(Debug)]
pub struct TargetRunner {
    command: Vec<String>,
    scratch: NamedTempFile,
}

impl TargetRunner {
    /// Creates a runner for `<command[0]> <command[1..]> <input-path>`.
    pub fn new(command: Vec<String>) -> Result<Self, RunnerError> {
        if command.is_empty() {
            return Err(RunnerError::EmptyCommand);
        }
        let scratch = tempfile::Builder::new()
            .prefix("skitter_input_")
            .tempfile()
            .map_err(|e| {
                RunnerError::InputWrite(PathBuf::from("<scratch>"), e.to_string())
            })?;
        Ok(Self { command, scratch })
    }

    /// Runs the target once on `candidate` and waits for it to exit.
    ///
    /// The target's stdout and stderr are discarded via `Stdio::null()`;
    /// piping them would let a chatty target fill the pipe buffer and block.
    pub fn run<I: Input>(&mut self, candidate: &I) -> Result<ExecutionResult, RunnerError> {
        let input_path = self.scratch.path().to_path_buf();
        File::create(&input_path)
            .and_then(|mut file| file.write_all(candidate.as_bytes()))
            .map_err(|e| RunnerError::InputWrite(input_path.clone(), e.to_string()))?;

        let mut child = Command::new(&self.command[0])
            .args(&self.command[1..])
            .arg(&input_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| RunnerError::Spawn(self.command[0].clone(), e.to_string()))?;

        let status = child
            .wait()
            .map_err(|e| RunnerError::Wait(self.command[0].clone(), e.to_string()))?;
        Ok(classify(status))
    }

    /// The executable this runner invokes.
    pub fn executable(&self) -> &str {
        &self.command[0]
    }
}

fn classify(status: ExitStatus) -> ExecutionResult {
    if status.success() {
        return ExecutionResult::Success;
    }
    if let Some(code) = status.code() {
        return ExecutionResult::NonZeroExit(code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return ExecutionResult::Signaled(signal);
        }
    }
    // No exit code and no signal; nothing sensible to report beyond failure.
    ExecutionResult::NonZeroExit(-1)
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;

    fn shell_runner(script: &str) -> TargetRunner {
        // The runner appends the input path as the final argument, which a
        // `sh -c` script sees as $0.
        TargetRunner::new(vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            script.to_string(),
        ])
        .unwrap()
    }

    #[test]
    fn clean_exit_maps_to_success() {
        let mut runner = shell_runner("exit 0");
        let candidate: Vec<u8> = b"anything".to_vec();
        let result = runner.run(&candidate).unwrap();
        assert_eq!(result, ExecutionResult::Success);
    }

    #[test]
    fn nonzero_exit_carries_the_code() {
        let mut runner = shell_runner("exit 3");
        let candidate: Vec<u8> = b"anything".to_vec();
        let result = runner.run(&candidate).unwrap();
        assert_eq!(result, ExecutionResult::NonZeroExit(3));
    }

    #[test]
    fn signal_termination_maps_to_signaled() {
        let mut runner = shell_runner("kill -11 $$");
        let candidate: Vec<u8> = b"anything".to_vec();
        let result = runner.run(&candidate).unwrap();
        assert_eq!(result, ExecutionResult::Signaled(SIGSEGV));
    }

    #[test]
    fn target_receives_the_candidate_bytes() {
        let mut runner = shell_runner("grep -q hello \"$0\"");

        let matching: Vec<u8> = b"say hello there".to_vec();
        assert_eq!(runner.run(&matching).unwrap(), ExecutionResult::Success);

        let other: Vec<u8> = b"nothing here".to_vec();
        assert_eq!(runner.run(&other).unwrap(), ExecutionResult::NonZeroExit(1));
    }

    #[test]
    fn missing_executable_is_a_spawn_error() {
        let mut runner =
            TargetRunner::new(vec!["./no_such_executable_2931".to_string()]).unwrap();
        let candidate: Vec<u8> = vec![1];
        match runner.run(&candidate) {
            Err(RunnerError::Spawn(exe, _)) => {
                assert_eq!(exe, "./no_such_executable_2931");
            }
            other => panic!("expected Spawn error, got {other:?}"),
        }
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(
            TargetRunner::new(Vec::new()),
            Err(RunnerError::EmptyCommand)
        ));
    }

    #[test]
    fn runners_use_distinct_scratch_files() {
        let a = shell_runner("exit 0");
        let b = shell_runner("exit 0");
        assert_ne!(a.scratch.path(), b.scratch.path());
    }
}
