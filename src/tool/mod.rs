//! External tools: the dependency manager and version control.
//!
//! Everything goes through [`ToolRunner`] so lifecycle operations can be
//! tested without spawning processes.

mod composer;
mod git;
mod process;

use anyhow::Result;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub use composer::Composer;
pub use git::Git;
pub use process::ProcessRunner;

/// One invocation of an external program.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub timeout: Duration,
    /// Inherit stdout/stderr instead of capturing them.
    pub stream: bool,
}

impl ToolCommand {
    pub fn new(program: &str, cwd: PathBuf, timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            cwd,
            timeout,
            stream: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn streamed(mut self) -> Self {
        self.stream = true;
        self
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// How a finished (or abandoned) invocation ended.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolOutput {
    /// Exit code; `None` when killed by a signal or on timeout.
    pub code: Option<i32>,
    pub timed_out: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            ..Default::default()
        }
    }

    pub fn failure(code: i32, stderr: &str) -> Self {
        Self {
            code: Some(code),
            stderr: stderr.to_string(),
            ..Default::default()
        }
    }

    pub fn timeout() -> Self {
        Self {
            timed_out: true,
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        !self.timed_out && self.code == Some(0)
    }

    /// Short reason for a failed run.
    pub fn failure_reason(&self) -> String {
        if self.timed_out {
            return "timed out".to_string();
        }
        let detail = self.stderr.trim();
        match (self.code, detail.is_empty()) {
            (Some(code), true) => format!("exit code {}", code),
            (Some(code), false) => format!("exit code {}: {}", code, detail),
            (None, _) => "terminated by signal".to_string(),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait ToolRunner: Send + Sync {
    /// Run `command` to completion or until its timeout.
    ///
    /// Returns `Err` only when the program cannot be started; non-zero exit
    /// codes and timeouts are reported through [`ToolOutput`].
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput>;
}
