//! Lifecycle operations on local packages.
//!
//! A [`Workspace`] wires the package, manifest and tool components for one
//! project. Each operation composes them by direct calls; the manifest is
//! always written before the dependency manager runs.

mod batch;
mod install;
mod list;
mod make;
mod remove;

use anyhow::Result;
use log::debug;
use std::path::PathBuf;

use crate::commands::config::Config;
use crate::manifest::{ManifestStore, RepositoryManager, RequirementSync};
use crate::package::{
    ConflictDetector, LinkManager, LocalRegistry, ManifestScaffolder, PackageId, PackageRoots,
    Scaffolder,
};
use crate::runtime::{Runtime, relative_to_project};
use crate::tool::{Composer, Git, ToolOutput, ToolRunner};

pub use batch::{BatchReport, Scope, Selection};
pub use install::InstallOptions;
pub use list::PackageSummary;
pub use make::MakeOptions;

pub struct Workspace<'a, R: Runtime, T: ToolRunner> {
    runtime: &'a R,
    config: &'a Config,
    registry: LocalRegistry<'a, R>,
    roots: PackageRoots<'a, R>,
    repositories: RepositoryManager<'a, R>,
    requirements: RequirementSync<'a, R>,
    links: LinkManager<'a, R>,
    composer: Composer<'a, T>,
    git: Git<'a, T>,
    scaffolder: Box<dyn Scaffolder + 'a>,
}

impl<'a, R: Runtime, T: ToolRunner> Workspace<'a, R, T> {
    pub fn new(runtime: &'a R, runner: &'a T, config: &'a Config) -> Self {
        Self {
            runtime,
            config,
            registry: LocalRegistry::new(runtime, config.registry_path.clone()),
            roots: PackageRoots::new(runtime, &config.project_root, &config.packages_root),
            repositories: RepositoryManager::new(runtime, &config.project_root),
            requirements: RequirementSync::new(ManifestStore::new(
                runtime,
                config.manifest_path(),
            )),
            links: LinkManager::new(runtime, config.vendor_dir.clone()),
            composer: Composer::new(
                runner,
                &config.composer,
                config.project_root.clone(),
                config.composer_timeout,
            ),
            git: Git::new(runner, &config.git, config.git_timeout),
            scaffolder: Box::new(ManifestScaffolder::new(runtime)),
        }
    }

    /// Replace the skeleton written into newly made packages.
    pub fn with_scaffolder(mut self, scaffolder: Box<dyn Scaffolder + 'a>) -> Self {
        self.scaffolder = scaffolder;
        self
    }

    fn conflicts(&self) -> ConflictDetector<'_, R> {
        ConflictDetector::new(
            self.runtime,
            &self.config.project_root,
            &self.requirements,
            &self.repositories,
        )
    }

    /// Find the directory of `id`: registry first, then the package roots,
    /// then the manifest's path repositories.
    fn locate(&self, id: &PackageId) -> Result<Option<PathBuf>> {
        if let Some(path) = self.registry.get(id)
            && self.runtime.is_dir(&path)
        {
            return Ok(Some(path));
        }
        if let Some(path) = self.find_in_roots(id) {
            return Ok(Some(path));
        }
        let found = self.repositories.find_packages_under(id)?;
        if found.len() > 1 {
            debug!("{} is reachable at {} locations, using the first", id, found.len());
        }
        Ok(found.into_iter().next())
    }

    /// `id` under the package roots: its conventional location, or any
    /// `root/*/*` directory whose manifest declares it, the way `--all`
    /// discovers packages.
    fn find_in_roots(&self, id: &PackageId) -> Option<PathBuf> {
        self.roots
            .resolve(id)
            .or_else(|| self.roots.discover().remove(id))
    }

    fn display_path(&self, path: &std::path::Path) -> String {
        relative_to_project(&self.config.project_root, path)
    }

    /// Report a dependency manager run. Failures are warnings: the manifest
    /// is already written and re-running the operation recovers.
    fn report_composer(&self, action: &str, id: &PackageId, result: Result<ToolOutput>) {
        match result {
            Ok(output) if output.is_success() => {}
            Ok(output) => eprintln!(
                "Warning: composer {} failed for {} ({})",
                action,
                id,
                output.failure_reason()
            ),
            Err(e) => eprintln!(
                "Warning: composer {} could not run for {}: {:#}",
                action, id, e
            ),
        }
    }
}
