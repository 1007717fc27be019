use anyhow::{Context, Result, bail};

use crate::package::{PackageId, ensure_ignored, resolve_branch};
use crate::runtime::Runtime;
use crate::tool::ToolRunner;

use super::{InstallOptions, Workspace};

#[derive(Debug, Clone, Default)]
pub struct MakeOptions {
    /// Branch for the new repository; the configured default when `None`.
    pub branch: Option<String>,
    /// Install right away.
    pub install: bool,
    /// Require as a development dependency when installing.
    pub dev: bool,
}

impl<R: Runtime, T: ToolRunner> Workspace<'_, R, T> {
    /// Create a new package under the configured root, register it and
    /// add its repository entry; optionally install it.
    #[tracing::instrument(skip(self))]
    pub fn make(&self, id: &PackageId, options: &MakeOptions) -> Result<()> {
        let root = &self.config.packages_root;
        let dir = id.dir_under(root);
        if self.runtime.exists(&dir) {
            bail!("Directory {} already exists", self.display_path(&dir));
        }

        for conflict in self.conflicts().detect(id, None) {
            eprintln!("Warning: {}", conflict);
        }

        let root_created = !self.runtime.is_dir(root);
        self.runtime
            .create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", self.display_path(&dir)))?;
        if root_created
            && let Some(pattern) = self.config.ignore_pattern()
            && let Err(e) = ensure_ignored(self.runtime, &self.config.project_root, &pattern)
        {
            eprintln!("Warning: Could not update .gitignore: {:#}", e);
        }

        self.scaffolder.scaffold(id, &dir)?;

        let (branch, _) = resolve_branch(options.branch.as_deref(), &self.config.default_branch);
        self.git.init_repo(&dir, &branch);

        self.registry.add(id, &dir)?;
        self.repositories.ensure(&dir)?;
        println!("Created {} at {}", id, self.display_path(&dir));

        if options.install {
            self.install(
                id,
                &InstallOptions {
                    dev: options.dev,
                    branch: Some(branch),
                },
            )?;
        }
        Ok(())
    }
}
