//! Command entry points: load the configuration, build a [`Workspace`] and
//! run the requested operation over the selected packages.

use anyhow::Result;
use log::debug;

use crate::application::{InstallOptions, MakeOptions, Scope, Selection, Workspace};
use crate::package::PackageId;
use crate::runtime::Runtime;
use crate::tool::ToolRunner;

pub mod config;
mod paths;

use config::{Config, ConfigOverrides};

/// Create a new local package.
#[tracing::instrument(skip(runtime, runner, overrides))]
pub fn make<R: Runtime, T: ToolRunner>(
    runtime: &R,
    runner: &T,
    overrides: ConfigOverrides,
    name: &str,
    options: MakeOptions,
) -> Result<()> {
    let config = Config::load(runtime, overrides)?;
    let id = name.parse::<PackageId>()?;
    let ws = Workspace::new(runtime, runner, &config);
    ws.make(&id, &options)
}

#[tracing::instrument(skip(runtime, runner, overrides))]
pub fn install<R: Runtime, T: ToolRunner>(
    runtime: &R,
    runner: &T,
    overrides: ConfigOverrides,
    selection: Selection,
    options: InstallOptions,
) -> Result<()> {
    let config = Config::load(runtime, overrides)?;
    let ws = Workspace::new(runtime, runner, &config);
    ws.run_batch(&selection, Scope::RegisteredAndDiscovered, |id| {
        ws.install(id, &options)
    })
    .into_result()
}

#[tracing::instrument(skip(runtime, runner, overrides))]
pub fn reinstall<R: Runtime, T: ToolRunner>(
    runtime: &R,
    runner: &T,
    overrides: ConfigOverrides,
    selection: Selection,
    options: InstallOptions,
) -> Result<()> {
    let config = Config::load(runtime, overrides)?;
    let ws = Workspace::new(runtime, runner, &config);
    ws.run_batch(&selection, Scope::RegisteredAndDiscovered, |id| {
        ws.reinstall(id, &options)
    })
    .into_result()
}

#[tracing::instrument(skip(runtime, runner, overrides))]
pub fn uninstall<R: Runtime, T: ToolRunner>(
    runtime: &R,
    runner: &T,
    overrides: ConfigOverrides,
    selection: Selection,
) -> Result<()> {
    let config = Config::load(runtime, overrides)?;
    let ws = Workspace::new(runtime, runner, &config);
    ws.run_batch(&selection, Scope::RegisteredAndDiscovered, |id| ws.uninstall(id))
        .into_result()
}

/// Remove packages. `--all` only reaches packages this engine created.
#[tracing::instrument(skip(runtime, runner, overrides))]
pub fn remove<R: Runtime, T: ToolRunner>(
    runtime: &R,
    runner: &T,
    overrides: ConfigOverrides,
    selection: Selection,
    keep_dir: bool,
) -> Result<()> {
    let config = Config::load(runtime, overrides)?;
    debug!("Removing from {:?} keep_dir={}", config.project_root, keep_dir);
    let ws = Workspace::new(runtime, runner, &config);
    ws.run_batch(&selection, Scope::Registered, |id| ws.remove(id, keep_dir))
        .into_result()
}

#[tracing::instrument(skip(runtime, runner, overrides))]
pub fn remake<R: Runtime, T: ToolRunner>(
    runtime: &R,
    runner: &T,
    overrides: ConfigOverrides,
    selection: Selection,
    options: MakeOptions,
) -> Result<()> {
    let config = Config::load(runtime, overrides)?;
    let ws = Workspace::new(runtime, runner, &config);
    ws.run_batch(&selection, Scope::Registered, |id| ws.remake(id, &options))
        .into_result()
}

#[tracing::instrument(skip(runtime, runner, overrides))]
pub fn list<R: Runtime, T: ToolRunner>(
    runtime: &R,
    runner: &T,
    overrides: ConfigOverrides,
) -> Result<()> {
    let config = Config::load(runtime, overrides)?;
    let ws = Workspace::new(runtime, runner, &config);
    ws.list()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RealRuntime;
    use crate::tool::{MockToolRunner, ToolOutput};
    use std::fs;
    use std::path::Path;

    fn overrides(root: &Path) -> ConfigOverrides {
        ConfigOverrides {
            project_root: Some(root.to_path_buf()),
            ..Default::default()
        }
    }

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("composer.json"), "{}\n").unwrap();
        dir
    }

    fn ok_runner() -> MockToolRunner {
        let mut runner = MockToolRunner::new();
        runner.expect_run().returning(|_| Ok(ToolOutput::success()));
        runner
    }

    #[test]
    fn test_make_rejects_invalid_name() {
        let dir = project();
        let runner = MockToolRunner::new();
        let err = make(
            &RealRuntime,
            &runner,
            overrides(dir.path()),
            "not-a-package",
            MakeOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("vendor/package"));
    }

    #[test]
    fn test_make_then_list() {
        let dir = project();
        let runner = ok_runner();
        make(
            &RealRuntime,
            &runner,
            overrides(dir.path()),
            "acme/widget",
            MakeOptions::default(),
        )
        .unwrap();

        assert!(dir.path().join("packages/acme/widget/composer.json").exists());
        list(&RealRuntime, &runner, overrides(dir.path())).unwrap();
    }

    #[test]
    fn test_remove_all_only_touches_registered() {
        let dir = project();
        let runner = ok_runner();
        make(
            &RealRuntime,
            &runner,
            overrides(dir.path()),
            "acme/widget",
            MakeOptions::default(),
        )
        .unwrap();
        let foreign = dir.path().join("packages/other/tool");
        fs::create_dir_all(&foreign).unwrap();
        fs::write(foreign.join("composer.json"), r#"{"name": "other/tool"}"#).unwrap();

        remove(&RealRuntime, &runner, overrides(dir.path()), Selection::All, false).unwrap();

        assert!(!dir.path().join("packages/acme/widget").exists());
        assert!(foreign.exists());
    }

    #[test]
    fn test_batch_failure_is_an_error() {
        let dir = project();
        let runner = ok_runner();
        let selection = Selection::Named(vec!["acme/widget".to_string(), "bad".to_string()]);
        let err = uninstall(&RealRuntime, &runner, overrides(dir.path()), selection).unwrap_err();
        assert!(err.to_string().contains("1 of 2"));
    }

    #[test]
    fn test_commands_require_a_project() {
        let dir = tempfile::tempdir().unwrap();
        let runner = MockToolRunner::new();
        assert!(list(&RealRuntime, &runner, overrides(dir.path())).is_err());
    }
}
