use anyhow::Result;
use log::debug;

use crate::package::{Conflict, PackageId, resolve_branch};
use crate::runtime::Runtime;
use crate::tool::ToolRunner;

use super::Workspace;

#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Require in `require-dev` instead of `require`.
    pub dev: bool,
    /// Branch or `dev-` constraint; the configured default when `None`.
    pub branch: Option<String>,
}

impl<R: Runtime, T: ToolRunner> Workspace<'_, R, T> {
    /// Make an existing local package a dependency of the project.
    ///
    /// A package that cannot be found is skipped with a warning.
    #[tracing::instrument(skip(self))]
    pub fn install(&self, id: &PackageId, options: &InstallOptions) -> Result<()> {
        let Some(dir) = self.locate(id)? else {
            eprintln!("Warning: Package {} not found; skipping.", id);
            return Ok(());
        };
        debug!("Installing {} from {:?}", id, dir);

        // Being required already is the normal state on a re-run.
        for conflict in self.conflicts().detect(id, Some(&dir)) {
            if let Conflict::ReachableViaRepository { .. } = conflict {
                eprintln!("Warning: {}", conflict);
            }
        }

        self.repositories.ensure(&dir)?;
        let (_, constraint) =
            resolve_branch(options.branch.as_deref(), &self.config.default_branch);
        self.requirements.require(id, &constraint, options.dev)?;

        println!("Running composer update {} ...", id);
        self.report_composer("update", id, self.composer.update(Some(id)));

        self.links.create(id, &dir)?;
        println!("Installed {} ({})", id, constraint);
        Ok(())
    }

    /// Drop the dependency and its link; the package itself stays.
    #[tracing::instrument(skip(self))]
    pub fn uninstall(&self, id: &PackageId) -> Result<()> {
        let removed = self.requirements.remove_requirement(id)?;
        if removed.is_empty() {
            println!("{} is not required by the project", id);
        } else {
            println!("Running composer update {} ...", id);
            self.report_composer("update", id, self.composer.update(Some(id)));
        }

        self.links.remove(id)?;
        println!("Uninstalled {}", id);
        Ok(())
    }

    /// Uninstall, drop the exact repository entry, then install again.
    #[tracing::instrument(skip(self))]
    pub fn reinstall(&self, id: &PackageId, options: &InstallOptions) -> Result<()> {
        self.requirements.remove_requirement(id)?;
        self.links.remove(id)?;
        if let Some(dir) = self.locate(id)? {
            self.repositories.remove_by_path(&dir)?;
        }
        self.install(id, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::tests::{ok_runner, project, widget, write_package};
    use crate::manifest::{Manifest, Section};
    use crate::package::LinkStatus;
    use crate::runtime::RealRuntime;
    use crate::tool::{MockToolRunner, ToolOutput};
    use std::fs;
    use std::path::Path;

    fn manifest(root: &Path) -> Manifest {
        Manifest::parse(&fs::read_to_string(root.join("composer.json")).unwrap()).unwrap()
    }

    #[cfg_attr(
        lpkg_skip_cross_windows_tests,
        ignore = "cross windows tests disabled; set LPKG_RUN_CROSS_WINDOWS_TESTS=1 to enable"
    )]
    #[test]
    fn test_install_full_flow() {
        let (dir, config) = project();
        let pkg = dir.path().join("packages/acme/widget");
        write_package(&pkg, "acme/widget");

        let runtime = RealRuntime;
        let mut runner = MockToolRunner::new();
        runner
            .expect_run()
            .withf(|c| c.args == ["update", "acme/widget"])
            .times(1)
            .returning(|_| Ok(ToolOutput::success()));
        let ws = Workspace::new(&runtime, &runner, &config);

        ws.install(&widget(), &InstallOptions::default()).unwrap();

        let m = manifest(dir.path());
        assert_eq!(m.require.as_ref().unwrap().get("acme/widget"), Some("dev-main"));
        assert_eq!(m.repositories()[0].path_url(), Some("packages/acme/widget"));
        assert_eq!(ws.links.status(&widget(), &pkg), LinkStatus::Linked);
        // installing does not register
        assert!(ws.registry.all().is_empty());
    }

    #[test]
    fn test_install_missing_package_is_skipped() {
        let (dir, config) = project();
        let before = fs::read_to_string(dir.path().join("composer.json")).unwrap();
        let runtime = RealRuntime;
        let runner = MockToolRunner::new();
        let ws = Workspace::new(&runtime, &runner, &config);

        ws.install(&widget(), &InstallOptions::default()).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("composer.json")).unwrap(),
            before
        );
    }

    #[test]
    fn test_install_survives_composer_failure() {
        let (dir, config) = project();
        write_package(&dir.path().join("packages/acme/widget"), "acme/widget");

        let runtime = RealRuntime;
        let mut runner = MockToolRunner::new();
        runner
            .expect_run()
            .returning(|_| Ok(ToolOutput::failure(2, "Your requirements could not be resolved")));
        let ws = Workspace::new(&runtime, &runner, &config);

        let options = InstallOptions {
            dev: true,
            branch: Some("feature-x".to_string()),
        };
        ws.install(&widget(), &options).unwrap();

        let m = manifest(dir.path());
        assert_eq!(m.require_dev.as_ref().unwrap().get("acme/widget"), Some("dev-feature-x"));
    }

    #[test]
    fn test_install_switches_section() {
        let (dir, config) = project();
        write_package(&dir.path().join("packages/acme/widget"), "acme/widget");
        let runtime = RealRuntime;
        let runner = ok_runner();
        let ws = Workspace::new(&runtime, &runner, &config);

        ws.install(&widget(), &InstallOptions { dev: true, branch: None }).unwrap();
        ws.install(&widget(), &InstallOptions::default()).unwrap();

        assert_eq!(
            ws.requirements.is_required(&widget()).unwrap(),
            Some(Section::Require)
        );
        let m = manifest(dir.path());
        assert!(!m.require_dev.as_ref().unwrap().contains("acme/widget"));
        assert_eq!(m.repositories().len(), 1);
    }

    #[test]
    fn test_uninstall_keeps_repository_and_directory() {
        let (dir, config) = project();
        let pkg = dir.path().join("packages/acme/widget");
        write_package(&pkg, "acme/widget");
        let runtime = RealRuntime;
        let runner = ok_runner();
        let ws = Workspace::new(&runtime, &runner, &config);

        ws.install(&widget(), &InstallOptions::default()).unwrap();
        ws.uninstall(&widget()).unwrap();

        assert_eq!(ws.requirements.is_required(&widget()).unwrap(), None);
        assert!(ws.repositories.has_exact(&pkg).unwrap());
        assert!(pkg.is_dir());
        assert_eq!(ws.links.status(&widget(), &pkg), LinkStatus::Missing);
    }

    #[test]
    fn test_uninstall_not_required_skips_composer() {
        let (_dir, config) = project();
        let runtime = RealRuntime;
        let mut runner = MockToolRunner::new();
        runner.expect_run().never();
        let ws = Workspace::new(&runtime, &runner, &config);

        ws.uninstall(&widget()).unwrap();
    }

    #[test]
    fn test_reinstall_restores_state() {
        let (dir, config) = project();
        let pkg = dir.path().join("packages/acme/widget");
        write_package(&pkg, "acme/widget");
        let runtime = RealRuntime;
        let runner = ok_runner();
        let ws = Workspace::new(&runtime, &runner, &config);

        ws.install(&widget(), &InstallOptions::default()).unwrap();
        let options = InstallOptions {
            dev: true,
            branch: Some("dev-next".to_string()),
        };
        ws.reinstall(&widget(), &options).unwrap();

        let m = manifest(dir.path());
        assert_eq!(m.require_dev.as_ref().unwrap().get("acme/widget"), Some("dev-next"));
        assert!(!m.require.as_ref().unwrap().contains("acme/widget"));
        assert_eq!(m.repositories().len(), 1);
        assert!(pkg.is_dir());
    }
}
