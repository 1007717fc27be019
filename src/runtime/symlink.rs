//! Link operations (symlink, junction, read, resolve, remove).

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::RealRuntime;
use super::path::normalize_path;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn symlink_impl(&self, original: &Path, link: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::symlink as unix_symlink;
            unix_symlink(original, link).context("Failed to create symlink")?;
        }
        #[cfg(windows)]
        {
            use std::os::windows::fs::{symlink_dir, symlink_file};

            // `is_dir()` on a relative path is relative to CWD; we want it relative to the link's parent.
            let target_path = if original.is_absolute() {
                original.to_path_buf()
            } else {
                link.parent()
                    .context("Failed to get parent directory for symlink")?
                    .join(original)
            };

            if target_path.is_dir() {
                symlink_dir(original, link).context("Failed to create directory symlink")?;
            } else {
                symlink_file(original, link).context("Failed to create file symlink")?;
            }
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn junction_impl(&self, target: &Path, link: &Path) -> Result<()> {
        #[cfg(windows)]
        {
            use anyhow::bail;
            use std::process::Command;

            let output = Command::new("cmd")
                .args(["/C", "mklink", "/J"])
                .arg(link)
                .arg(target)
                .output()
                .context("Failed to run mklink")?;
            if !output.status.success() {
                bail!(
                    "mklink /J failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }
            Ok(())
        }
        #[cfg(not(windows))]
        {
            anyhow::bail!(
                "Directory junctions are not supported on this platform ({:?} -> {:?})",
                link,
                target
            )
        }
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn resolve_link_impl(&self, path: &Path) -> Result<PathBuf> {
        let target = fs::read_link(path).context("Failed to read symlink")?;
        if target.is_absolute() {
            Ok(target)
        } else {
            let parent = path
                .parent()
                .context("Failed to get parent directory of symlink")?;
            Ok(normalize_path(&parent.join(&target)))
        }
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn canonicalize_impl(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).context("Failed to canonicalize path")
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_symlink_impl(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn remove_symlink_impl(&self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            fs::remove_file(path).context("Failed to remove symlink")?;
        }
        #[cfg(windows)]
        {
            // Directory symlinks need remove_dir, file symlinks remove_file.
            fs::remove_dir(path)
                .or_else(|_| fs::remove_file(path))
                .context("Failed to remove symlink")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};
    use tempfile::tempdir;

    #[cfg_attr(
        lpkg_skip_cross_windows_tests,
        ignore = "cross windows tests disabled; set LPKG_RUN_CROSS_WINDOWS_TESTS=1 to enable"
    )]
    #[test]
    fn test_real_runtime_symlink_ops() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let target = dir.path().join("packages/acme/widget");
        runtime.create_dir_all(&target).unwrap();

        let link = dir.path().join("widget-link");
        runtime.symlink(&target, &link).unwrap();
        assert!(runtime.is_symlink(&link));
        assert!(!runtime.is_symlink(&target));
        assert!(runtime.is_dir(&link));

        assert_eq!(runtime.resolve_link(&link).unwrap(), target);

        let canonical = runtime.canonicalize(&link).unwrap();
        assert!(canonical.ends_with("widget"));

        runtime.remove_symlink(&link).unwrap();
        assert!(!runtime.exists(&link));
        assert!(runtime.exists(&target));
    }

    #[cfg_attr(
        lpkg_skip_cross_windows_tests,
        ignore = "cross windows tests disabled; set LPKG_RUN_CROSS_WINDOWS_TESTS=1 to enable"
    )]
    #[test]
    fn test_resolve_relative_link() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let target = dir.path().join("packages/acme/widget");
        runtime.create_dir_all(&target).unwrap();
        let link_dir = dir.path().join("vendor/acme");
        runtime.create_dir_all(&link_dir).unwrap();

        let link = link_dir.join("widget");
        runtime
            .symlink(std::path::Path::new("../../packages/acme/widget"), &link)
            .unwrap();

        assert_eq!(runtime.resolve_link(&link).unwrap(), target);
    }

    #[test]
    fn test_is_symlink_missing_path() {
        let runtime = RealRuntime;
        assert!(!runtime.is_symlink(std::path::Path::new("/nonexistent/link")));
    }

    #[cfg(not(windows))]
    #[test]
    fn test_junction_unsupported() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let result = runtime.junction(dir.path(), &dir.path().join("link"));
        assert!(result.is_err());
    }
}
