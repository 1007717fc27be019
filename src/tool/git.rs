use log::{debug, warn};
use std::path::Path;
use std::time::Duration;

use super::{ToolCommand, ToolRunner};

/// Version control for newly made packages. Failures never abort the
/// calling operation; they are reported as warnings.
pub struct Git<'a, T: ToolRunner> {
    runner: &'a T,
    program: String,
    timeout: Duration,
}

impl<'a, T: ToolRunner> Git<'a, T> {
    pub fn new(runner: &'a T, program: &str, timeout: Duration) -> Self {
        Self {
            runner,
            program: program.to_string(),
            timeout,
        }
    }

    /// Initialize a repository in `dir` on `branch`, or switch an existing
    /// repository to `branch`. Returns whether `branch` is checked out.
    #[tracing::instrument(skip(self))]
    pub fn init_repo(&self, dir: &Path, branch: &str) -> bool {
        if dir.join(".git").exists() {
            return self.ensure_branch(dir, branch);
        }

        if self.succeeds(dir, &["init", "-b", branch]) {
            println!("Initialized git repository on branch {}", branch);
            return true;
        }

        // `init -b` needs git 2.28+.
        debug!("git init -b failed in {:?}, retrying without a branch", dir);
        if !self.succeeds(dir, &["init"]) {
            eprintln!(
                "Warning: Could not initialize a git repository in {}",
                dir.display()
            );
            return false;
        }
        self.ensure_branch(dir, branch)
    }

    /// Check out `branch`, creating it when it does not exist.
    fn ensure_branch(&self, dir: &Path, branch: &str) -> bool {
        let switched = if self.succeeds(dir, &["rev-parse", "--verify", branch]) {
            self.succeeds(dir, &["checkout", branch])
        } else {
            self.succeeds(dir, &["checkout", "-b", branch])
        };
        if !switched {
            eprintln!(
                "Warning: Could not switch {} to branch {}",
                dir.display(),
                branch
            );
        }
        switched
    }

    fn succeeds(&self, dir: &Path, args: &[&str]) -> bool {
        let command = ToolCommand::new(&self.program, dir.to_path_buf(), self.timeout)
            .args(args.iter().copied());
        match self.runner.run(&command) {
            Ok(output) if output.is_success() => true,
            Ok(output) => {
                debug!("{} failed: {}", command, output.failure_reason());
                false
            }
            Err(e) => {
                warn!("{} could not run: {:#}", command, e);
                false
            }
        }
    }
}
