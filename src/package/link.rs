//! Links from the project's dependency directory to local packages.
//!
//! A local package is exposed at `<project>/<vendor-dir>/<vendor>/<name>`.
//! Creation walks an ordered list of strategies (symbolic link, then
//! directory junction); when every strategy fails the operator is told to
//! create the link by hand and the lifecycle operation carries on.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::package::PackageId;
use crate::runtime::{Runtime, normalize_path, relative_symlink_path};

/// A way of materializing a link, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStrategy {
    /// Symbolic link, relative target preferred, absolute as fallback.
    Symlink,
    /// Directory junction (Windows).
    Junction,
}

impl LinkStrategy {
    pub const ORDER: [LinkStrategy; 2] = [LinkStrategy::Symlink, LinkStrategy::Junction];
}

/// Result of [`LinkManager::create`].
#[derive(Debug, Clone, PartialEq)]
pub enum LinkOutcome {
    Symlinked(PathBuf),
    Junction(PathBuf),
    /// A real file or directory occupies the link path; left untouched.
    Blocked(PathBuf),
    /// Every strategy failed; manual intervention required.
    Failed(PathBuf),
}

impl LinkOutcome {
    pub fn is_linked(&self) -> bool {
        matches!(self, LinkOutcome::Symlinked(_) | LinkOutcome::Junction(_))
    }
}

/// Result of [`LinkManager::remove`].
#[derive(Debug, Clone, PartialEq)]
pub enum UnlinkOutcome {
    Absent,
    Removed,
    ManualCleanup(PathBuf),
}

/// State of a package's link, as reported by `list`.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkStatus {
    Linked,
    Missing,
    ElsewhereLinked(PathBuf),
    NotALink,
}

impl LinkStatus {
    pub fn describe(&self) -> String {
        match self {
            LinkStatus::Linked => "linked".to_string(),
            LinkStatus::Missing => "not linked".to_string(),
            LinkStatus::ElsewhereLinked(target) => format!("linked to {}", target.display()),
            LinkStatus::NotALink => "occupied by a real directory".to_string(),
        }
    }
}

pub struct LinkManager<'a, R: Runtime> {
    runtime: &'a R,
    vendor_dir: PathBuf,
}

impl<'a, R: Runtime> LinkManager<'a, R> {
    /// `vendor_dir` is the project's dependency directory, e.g. `<project>/vendor`.
    pub fn new(runtime: &'a R, vendor_dir: PathBuf) -> Self {
        Self {
            runtime,
            vendor_dir,
        }
    }

    pub fn link_path(&self, id: &PackageId) -> PathBuf {
        id.dir_under(&self.vendor_dir)
    }

    /// Point the package link at `target`, replacing an existing link.
    ///
    /// Only parent-directory and stale-link cleanup errors are returned as
    /// `Err`; an occupied path or a failed link are reported as outcomes.
    #[tracing::instrument(skip(self))]
    pub fn create(&self, id: &PackageId, target: &Path) -> Result<LinkOutcome> {
        let link = self.link_path(id);

        if let Some(parent) = link.parent()
            && !self.runtime.exists(parent)
        {
            self.runtime
                .create_dir_all(parent)
                .with_context(|| format!("Failed to create link directory {:?}", parent))?;
        }

        if self.runtime.is_symlink(&link) {
            debug!("Replacing existing link {:?}", link);
            self.runtime
                .remove_symlink(&link)
                .with_context(|| format!("Failed to remove existing link {:?}", link))?;
        } else if self.runtime.exists(&link) {
            eprintln!(
                "Warning: {} exists and is not a link; leaving it in place.",
                link.display()
            );
            return Ok(LinkOutcome::Blocked(link));
        }

        for strategy in LinkStrategy::ORDER {
            match self.attempt(strategy, target, &link) {
                Ok(()) => {
                    println!("Linked {} -> {}", link.display(), target.display());
                    return Ok(match strategy {
                        LinkStrategy::Symlink => LinkOutcome::Symlinked(link),
                        LinkStrategy::Junction => LinkOutcome::Junction(link),
                    });
                }
                Err(e) => debug!("{:?} link failed for {:?}: {:#}", strategy, link, e),
            }
        }

        warn!("Could not link {:?} to {:?}", link, target);
        eprintln!(
            "Warning: Could not create a link at {}. Link it manually to {}.",
            link.display(),
            target.display()
        );
        Ok(LinkOutcome::Failed(link))
    }

    fn attempt(&self, strategy: LinkStrategy, target: &Path, link: &Path) -> Result<()> {
        match strategy {
            LinkStrategy::Symlink => {
                if let Some(relative) = relative_symlink_path(link, target) {
                    match self.runtime.symlink(&relative, link) {
                        Ok(()) => return Ok(()),
                        Err(e) => debug!("Relative symlink failed, trying absolute: {:#}", e),
                    }
                }
                self.runtime.symlink(target, link)
            }
            LinkStrategy::Junction => self.runtime.junction(target, link),
        }
    }

    /// Remove the package link and prune the vendor link directory when it
    /// is left empty.
    #[tracing::instrument(skip(self))]
    pub fn remove(&self, id: &PackageId) -> Result<UnlinkOutcome> {
        let link = self.link_path(id);

        let outcome = if self.runtime.is_symlink(&link) {
            self.runtime
                .remove_symlink(&link)
                .with_context(|| format!("Failed to remove link {:?}", link))?;
            UnlinkOutcome::Removed
        } else if !self.runtime.exists(&link) {
            UnlinkOutcome::Absent
        } else if self.runtime.is_dir(&link) && self.runtime.remove_dir(&link).is_ok() {
            UnlinkOutcome::Removed
        } else {
            eprintln!(
                "Warning: Could not remove {}. Remove it manually.",
                link.display()
            );
            UnlinkOutcome::ManualCleanup(link.clone())
        };

        if outcome == UnlinkOutcome::Removed {
            println!("Removed link {}", link.display());
        }
        if let Some(parent) = link.parent() {
            self.prune_empty(parent);
        }
        Ok(outcome)
    }

    /// Inspect the link without touching it.
    pub fn status(&self, id: &PackageId, expected: &Path) -> LinkStatus {
        let link = self.link_path(id);

        if self.runtime.is_symlink(&link) {
            let Ok(resolved) = self.runtime.resolve_link(&link) else {
                return LinkStatus::ElsewhereLinked(link);
            };
            if normalize_path(&resolved) == normalize_path(expected) {
                return LinkStatus::Linked;
            }
            match (
                self.runtime.canonicalize(&resolved),
                self.runtime.canonicalize(expected),
            ) {
                (Ok(a), Ok(b)) if a == b => LinkStatus::Linked,
                _ => LinkStatus::ElsewhereLinked(resolved),
            }
        } else if self.runtime.exists(&link) {
            LinkStatus::NotALink
        } else {
            LinkStatus::Missing
        }
    }

    fn prune_empty(&self, dir: &Path) {
        if !self.runtime.is_dir(dir) {
            return;
        }
        match self.runtime.read_dir(dir) {
            Ok(entries) if entries.is_empty() => {
                if let Err(e) = self.runtime.remove_dir(dir) {
                    debug!("Could not prune {:?}: {:#}", dir, e);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use mockall::predicate::eq;
    use std::fs;
    use tempfile::tempdir;

    fn widget() -> PackageId {
        "acme/widget".parse().unwrap()
    }

    #[test]
    fn test_link_path() {
        let runtime = MockRuntime::new();
        let manager = LinkManager::new(&runtime, PathBuf::from("/project/vendor"));
        assert_eq!(
            manager.link_path(&widget()),
            PathBuf::from("/project/vendor/acme/widget")
        );
    }

    #[cfg_attr(
        lpkg_skip_cross_windows_tests,
        ignore = "cross windows tests disabled; set LPKG_RUN_CROSS_WINDOWS_TESTS=1 to enable"
    )]
    #[test]
    fn test_create_relative_symlink() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("packages/acme/widget");
        fs::create_dir_all(&target).unwrap();

        let runtime = RealRuntime;
        let manager = LinkManager::new(&runtime, dir.path().join("vendor"));
        let outcome = manager.create(&widget(), &target).unwrap();

        let link = dir.path().join("vendor/acme/widget");
        assert_eq!(outcome, LinkOutcome::Symlinked(link.clone()));
        assert_eq!(
            fs::read_link(&link).unwrap(),
            PathBuf::from("../../packages/acme/widget")
        );
        assert_eq!(manager.status(&widget(), &target), LinkStatus::Linked);
    }

    #[cfg_attr(
        lpkg_skip_cross_windows_tests,
        ignore = "cross windows tests disabled; set LPKG_RUN_CROSS_WINDOWS_TESTS=1 to enable"
    )]
    #[test]
    fn test_create_replaces_existing_link() {
        let dir = tempdir().unwrap();
        let old = dir.path().join("old/acme/widget");
        let new = dir.path().join("packages/acme/widget");
        fs::create_dir_all(&old).unwrap();
        fs::create_dir_all(&new).unwrap();

        let runtime = RealRuntime;
        let manager = LinkManager::new(&runtime, dir.path().join("vendor"));
        manager.create(&widget(), &old).unwrap();
        assert!(matches!(
            manager.status(&widget(), &new),
            LinkStatus::ElsewhereLinked(_)
        ));

        assert!(manager.create(&widget(), &new).unwrap().is_linked());
        assert_eq!(manager.status(&widget(), &new), LinkStatus::Linked);
    }

    #[test]
    fn test_create_blocked_by_real_directory() {
        let dir = tempdir().unwrap();
        let occupied = dir.path().join("vendor/acme/widget");
        fs::create_dir_all(&occupied).unwrap();
        fs::write(occupied.join("keep.txt"), "x").unwrap();

        let runtime = RealRuntime;
        let manager = LinkManager::new(&runtime, dir.path().join("vendor"));
        let outcome = manager
            .create(&widget(), &dir.path().join("packages/acme/widget"))
            .unwrap();

        assert_eq!(outcome, LinkOutcome::Blocked(occupied.clone()));
        assert!(occupied.join("keep.txt").exists());
        assert_eq!(
            manager.status(&widget(), &dir.path().join("packages/acme/widget")),
            LinkStatus::NotALink
        );
    }

    #[test]
    fn test_create_falls_back_to_absolute_then_junction() {
        let link = PathBuf::from("/project/vendor/acme/widget");
        let target = PathBuf::from("/project/packages/acme/widget");

        let mut runtime = MockRuntime::new();
        let occupied = link.clone();
        runtime.expect_exists().returning(move |p| p != occupied);
        runtime.expect_is_symlink().returning(|_| false);
        runtime
            .expect_symlink()
            .times(2)
            .returning(|_, _| Err(anyhow::anyhow!("privilege not held")));
        runtime
            .expect_junction()
            .with(eq(target.clone()), eq(link.clone()))
            .times(1)
            .returning(|_, _| Ok(()));

        let manager = LinkManager::new(&runtime, PathBuf::from("/project/vendor"));
        let outcome = manager.create(&widget(), &target).unwrap();
        assert_eq!(outcome, LinkOutcome::Junction(link));
    }

    #[test]
    fn test_create_all_strategies_fail_is_soft() {
        let link = PathBuf::from("/project/vendor/acme/widget");

        let mut runtime = MockRuntime::new();
        let occupied = link.clone();
        runtime.expect_exists().returning(move |p| p != occupied);
        runtime.expect_is_symlink().returning(|_| false);
        runtime
            .expect_symlink()
            .returning(|_, _| Err(anyhow::anyhow!("privilege not held")));
        runtime
            .expect_junction()
            .returning(|_, _| Err(anyhow::anyhow!("unsupported")));

        let manager = LinkManager::new(&runtime, PathBuf::from("/project/vendor"));
        let outcome = manager
            .create(&widget(), Path::new("/project/packages/acme/widget"))
            .unwrap();
        assert_eq!(outcome, LinkOutcome::Failed(link));
        assert!(!outcome.is_linked());
    }

    #[cfg_attr(
        lpkg_skip_cross_windows_tests,
        ignore = "cross windows tests disabled; set LPKG_RUN_CROSS_WINDOWS_TESTS=1 to enable"
    )]
    #[test]
    fn test_remove_prunes_empty_vendor_dir() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("packages/acme/widget");
        fs::create_dir_all(&target).unwrap();

        let runtime = RealRuntime;
        let manager = LinkManager::new(&runtime, dir.path().join("vendor"));
        manager.create(&widget(), &target).unwrap();

        assert_eq!(manager.remove(&widget()).unwrap(), UnlinkOutcome::Removed);
        assert!(!dir.path().join("vendor/acme").exists());
        assert!(dir.path().join("vendor").exists());
        assert!(target.exists());
        assert_eq!(manager.status(&widget(), &target), LinkStatus::Missing);
    }

    #[test]
    fn test_remove_absent_is_success() {
        let dir = tempdir().unwrap();
        let runtime = RealRuntime;
        let manager = LinkManager::new(&runtime, dir.path().join("vendor"));
        assert_eq!(manager.remove(&widget()).unwrap(), UnlinkOutcome::Absent);
    }

    #[test]
    fn test_remove_empty_directory_as_junction() {
        let dir = tempdir().unwrap();
        let link = dir.path().join("vendor/acme/widget");
        fs::create_dir_all(&link).unwrap();
        fs::create_dir_all(dir.path().join("vendor/acme/other")).unwrap();

        let runtime = RealRuntime;
        let manager = LinkManager::new(&runtime, dir.path().join("vendor"));
        assert_eq!(manager.remove(&widget()).unwrap(), UnlinkOutcome::Removed);
        assert!(!link.exists());
        assert!(dir.path().join("vendor/acme/other").exists());
    }

    #[test]
    fn test_remove_occupied_needs_manual_cleanup() {
        let dir = tempdir().unwrap();
        let link = dir.path().join("vendor/acme/widget");
        fs::create_dir_all(&link).unwrap();
        fs::write(link.join("file.php"), "<?php").unwrap();

        let runtime = RealRuntime;
        let manager = LinkManager::new(&runtime, dir.path().join("vendor"));
        assert_eq!(
            manager.remove(&widget()).unwrap(),
            UnlinkOutcome::ManualCleanup(link.clone())
        );
        assert!(link.join("file.php").exists());
    }
}
