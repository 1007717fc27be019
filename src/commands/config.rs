//! Engine configuration.
//!
//! Values come from command-line options (or their environment variables),
//! then from an optional `package-engine.json` in the project root, then
//! from built-in defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::package::{normalize_branch_base, to_constraint};
use crate::runtime::{Runtime, is_path_under, relative_to_project, resolve_project_path};

use super::paths::find_project_root;

pub const CONFIG_FILE: &str = "package-engine.json";
pub const DEFAULT_PACKAGES_PATH: &str = "packages";
pub const DEFAULT_BRANCH_CONSTRAINT: &str = "dev-main";
pub const DEFAULT_REGISTRY_PATH: &str = "storage/app/package-engine/local-packages.json";
pub const DEFAULT_VENDOR_DIR: &str = "vendor";
pub const DEFAULT_COMPOSER_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_GIT_TIMEOUT_SECS: u64 = 60;

/// Options supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub project_root: Option<PathBuf>,
    pub packages_path: Option<String>,
    pub default_branch: Option<String>,
    pub composer: Option<String>,
    pub git: Option<String>,
}

/// Contents of `package-engine.json`. All keys are optional.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct FileConfig {
    pub packages_path: Option<String>,
    pub default_branch: Option<String>,
    pub registry_path: Option<String>,
    pub vendor_dir: Option<String>,
    pub composer_timeout: Option<u64>,
    pub git_timeout: Option<u64>,
}

impl FileConfig {
    /// Load the project file; a missing file is an empty configuration.
    pub fn load<R: Runtime>(runtime: &R, project_root: &Path) -> Result<Self> {
        let path = project_root.join(CONFIG_FILE);
        if !runtime.is_file(&path) {
            return Ok(Self::default());
        }
        let content = runtime.read_to_string(&path)?;
        serde_json::from_str(&content).with_context(|| format!("Invalid configuration {:?}", path))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub project_root: PathBuf,
    /// Packages path as configured, relative to the project root.
    pub packages_path: String,
    /// Absolute configured package root.
    pub packages_root: PathBuf,
    /// Default branch constraint, always `dev-` prefixed.
    pub default_branch: String,
    pub registry_path: PathBuf,
    pub vendor_dir: PathBuf,
    pub composer: String,
    pub git: String,
    pub composer_timeout: Duration,
    pub git_timeout: Duration,
}

impl Config {
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime>(runtime: &R, overrides: ConfigOverrides) -> Result<Self> {
        let project_root = find_project_root(runtime, overrides.project_root.as_deref())?;
        let file = FileConfig::load(runtime, &project_root)?;
        Ok(Self::resolve(project_root, file, overrides))
    }

    fn resolve(project_root: PathBuf, file: FileConfig, overrides: ConfigOverrides) -> Self {
        let packages_path = overrides
            .packages_path
            .or(file.packages_path)
            .map(|p| p.trim().trim_end_matches(['/', '\\']).to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_PACKAGES_PATH.to_string());
        let default_branch = overrides
            .default_branch
            .or(file.default_branch)
            .unwrap_or_else(|| DEFAULT_BRANCH_CONSTRAINT.to_string());
        let registry_path = file
            .registry_path
            .unwrap_or_else(|| DEFAULT_REGISTRY_PATH.to_string());
        let vendor_dir = file
            .vendor_dir
            .unwrap_or_else(|| DEFAULT_VENDOR_DIR.to_string());

        Self {
            packages_root: resolve_project_path(&project_root, &packages_path),
            registry_path: resolve_project_path(&project_root, &registry_path),
            vendor_dir: resolve_project_path(&project_root, &vendor_dir),
            packages_path,
            default_branch: to_constraint(&normalize_branch_base(&default_branch)),
            composer: overrides.composer.unwrap_or_else(|| "composer".to_string()),
            git: overrides.git.unwrap_or_else(|| "git".to_string()),
            composer_timeout: Duration::from_secs(
                file.composer_timeout.unwrap_or(DEFAULT_COMPOSER_TIMEOUT_SECS),
            ),
            git_timeout: Duration::from_secs(file.git_timeout.unwrap_or(DEFAULT_GIT_TIMEOUT_SECS)),
            project_root,
        }
    }

    /// Defaults for a project at `project_root`, with no project file.
    pub fn for_project(project_root: &Path) -> Self {
        Self::resolve(
            project_root.to_path_buf(),
            FileConfig::default(),
            ConfigOverrides::default(),
        )
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.project_root.join(crate::manifest::MANIFEST_FILE)
    }

    /// `.gitignore` line for the packages root, when it lies inside the project.
    pub fn ignore_pattern(&self) -> Option<String> {
        if !is_path_under(&self.packages_root, &self.project_root)
            || self.packages_root == self.project_root
        {
            return None;
        }
        Some(format!(
            "/{}/",
            relative_to_project(&self.project_root, &self.packages_root)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use crate::test_utils::test_project;
    use mockall::predicate::eq;

    #[test]
    fn test_defaults() {
        let project = test_project();
        let config = Config::for_project(&project);

        assert_eq!(config.packages_path, "packages");
        assert_eq!(config.packages_root, project.join("packages"));
        assert_eq!(config.default_branch, "dev-main");
        assert_eq!(
            config.registry_path,
            project
                .join("storage")
                .join("app")
                .join("package-engine")
                .join("local-packages.json")
        );
        assert_eq!(config.vendor_dir, project.join("vendor"));
        assert_eq!(config.composer, "composer");
        assert_eq!(config.composer_timeout, Duration::from_secs(600));
        assert_eq!(config.git_timeout, Duration::from_secs(60));
        assert_eq!(config.ignore_pattern().as_deref(), Some("/packages/"));
    }

    #[test]
    fn test_overrides_beat_file() {
        let project = test_project();
        let file = FileConfig {
            packages_path: Some("modules".to_string()),
            default_branch: Some("master".to_string()),
            vendor_dir: Some("deps".to_string()),
            composer_timeout: Some(30),
            ..Default::default()
        };
        let overrides = ConfigOverrides {
            packages_path: Some("local/pkgs/".to_string()),
            composer: Some("/opt/composer.phar".to_string()),
            ..Default::default()
        };

        let config = Config::resolve(project.clone(), file, overrides);
        assert_eq!(config.packages_path, "local/pkgs");
        assert_eq!(config.packages_root, project.join("local").join("pkgs"));
        assert_eq!(config.default_branch, "dev-master");
        assert_eq!(config.vendor_dir, project.join("deps"));
        assert_eq!(config.composer, "/opt/composer.phar");
        assert_eq!(config.git, "git");
        assert_eq!(config.composer_timeout, Duration::from_secs(30));
        assert_eq!(config.ignore_pattern().as_deref(), Some("/local/pkgs/"));
    }

    #[test]
    fn test_blank_packages_path_falls_back() {
        let overrides = ConfigOverrides {
            packages_path: Some("  ".to_string()),
            default_branch: Some("dev-".to_string()),
            ..Default::default()
        };
        let config = Config::resolve(test_project(), FileConfig::default(), overrides);
        assert_eq!(config.packages_path, "packages");
        assert_eq!(config.default_branch, "dev-main");
    }

    #[test]
    fn test_packages_outside_project_not_ignored() {
        let overrides = ConfigOverrides {
            packages_path: Some("../shared".to_string()),
            ..Default::default()
        };
        let config = Config::resolve(test_project(), FileConfig::default(), overrides);
        assert_eq!(config.ignore_pattern(), None);
    }

    #[test]
    fn test_load_reads_project_file() {
        let project = test_project();
        let mut runtime = MockRuntime::new();
        let cwd = project.clone();
        runtime.expect_current_dir().returning(move || Ok(cwd.clone()));
        runtime.expect_is_file().returning(|_| true);
        runtime
            .expect_read_to_string()
            .with(eq(project.join(CONFIG_FILE)))
            .returning(|_| Ok(r#"{"packages-path": "libs", "git-timeout": 5}"#.to_string()));

        let config = Config::load(&runtime, ConfigOverrides::default()).unwrap();
        assert_eq!(config.project_root, project);
        assert_eq!(config.packages_root, project.join("libs"));
        assert_eq!(config.git_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_current_dir()
            .returning(|| Ok(test_project()));
        runtime.expect_is_file().returning(|_| true);
        runtime
            .expect_read_to_string()
            .returning(|_| Ok(r#"{"git-timeout": "soon"}"#.to_string()));

        assert!(Config::load(&runtime, ConfigOverrides::default()).is_err());
    }
}
