use anyhow::{Context, Result};
use log::{debug, warn};
use std::process::Stdio;

use super::{ToolCommand, ToolOutput, ToolRunner};

/// Runs commands as child processes.
///
/// Each call drives a single-threaded tokio runtime for the lifetime of the
/// child so the timeout can be enforced; the child is killed when the
/// timeout elapses.
pub struct ProcessRunner;

impl ProcessRunner {
    async fn run_async(command: &ToolCommand) -> Result<ToolOutput> {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .current_dir(&command.cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if command.stream {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("Failed to start '{}'", command.program))?;

        match tokio::time::timeout(command.timeout, child.wait_with_output()).await {
            Ok(output) => {
                let output =
                    output.with_context(|| format!("Failed to wait for '{}'", command.program))?;
                Ok(ToolOutput {
                    code: output.status.code(),
                    timed_out: false,
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
            Err(_) => {
                warn!(
                    "'{}' did not finish within {:?}; killed",
                    command, command.timeout
                );
                Ok(ToolOutput::timeout())
            }
        }
    }
}

impl ToolRunner for ProcessRunner {
    #[tracing::instrument(skip_all, fields(command = %command))]
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        debug!("Running {} in {:?}", command, command.cwd);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create process runtime")?;
        runtime.block_on(Self::run_async(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_missing_program_is_an_error() {
        let dir = tempdir().unwrap();
        let command = ToolCommand::new(
            "lpkg-definitely-not-a-program",
            dir.path().to_path_buf(),
            Duration::from_secs(5),
        );
        assert!(ProcessRunner.run(&command).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_output_and_exit_code() {
        let dir = tempdir().unwrap();
        let command = ToolCommand::new("sh", dir.path().to_path_buf(), Duration::from_secs(10))
            .args(["-c", "echo out; echo err >&2; exit 3"]);

        let output = ProcessRunner.run(&command).unwrap();
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout.trim(), "out");
        assert_eq!(output.stderr.trim(), "err");
        assert!(!output.is_success());
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_in_working_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "").unwrap();
        let command = ToolCommand::new("ls", dir.path().to_path_buf(), Duration::from_secs(10));

        let output = ProcessRunner.run(&command).unwrap();
        assert!(output.is_success());
        assert!(output.stdout.contains("marker"));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_child() {
        let dir = tempdir().unwrap();
        let command = ToolCommand::new("sleep", dir.path().to_path_buf(), Duration::from_millis(200))
            .arg("30");

        let started = std::time::Instant::now();
        let output = ProcessRunner.run(&command).unwrap();
        assert!(output.timed_out);
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
