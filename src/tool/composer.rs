use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

use crate::package::PackageId;

use super::{ToolCommand, ToolOutput, ToolRunner};

/// The dependency manager, run in the project root with its output streamed.
pub struct Composer<'a, T: ToolRunner> {
    runner: &'a T,
    program: String,
    project_root: PathBuf,
    timeout: Duration,
}

impl<'a, T: ToolRunner> Composer<'a, T> {
    pub fn new(runner: &'a T, program: &str, project_root: PathBuf, timeout: Duration) -> Self {
        Self {
            runner,
            program: program.to_string(),
            project_root,
            timeout,
        }
    }

    fn command(&self) -> ToolCommand {
        ToolCommand::new(&self.program, self.project_root.clone(), self.timeout).streamed()
    }

    /// `composer remove <id>`
    pub fn remove(&self, id: &PackageId) -> Result<ToolOutput> {
        self.runner
            .run(&self.command().arg("remove").arg(id.to_string()))
    }

    /// `composer update [<id>]`
    pub fn update(&self, id: Option<&PackageId>) -> Result<ToolOutput> {
        let mut command = self.command().arg("update");
        if let Some(id) = id {
            command = command.arg(id.to_string());
        }
        self.runner.run(&command)
    }
}
