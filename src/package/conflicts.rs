//! Advisory checks run before a package is created or installed.

use log::warn;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::manifest::{RepositoryManager, RequirementSync, Section};
use crate::package::PackageId;
use crate::runtime::{Runtime, normalize_path, relative_to_project};

/// Something that suggests the package already exists in the project.
#[derive(Debug, Clone, PartialEq)]
pub enum Conflict {
    AlreadyRequired { id: PackageId, section: Section },
    ReachableViaRepository { id: PackageId, path: String },
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::AlreadyRequired { id, section } => write!(
                f,
                "Package {} is already listed in composer.json {}.",
                id, section
            ),
            Conflict::ReachableViaRepository { id, path } => write!(
                f,
                "Package {} is already found via a path repository at: {}",
                id, path
            ),
        }
    }
}

pub struct ConflictDetector<'a, R: Runtime> {
    runtime: &'a R,
    project_root: &'a Path,
    requirements: &'a RequirementSync<'a, R>,
    repositories: &'a RepositoryManager<'a, R>,
}

impl<'a, R: Runtime> ConflictDetector<'a, R> {
    pub fn new(
        runtime: &'a R,
        project_root: &'a Path,
        requirements: &'a RequirementSync<'a, R>,
        repositories: &'a RepositoryManager<'a, R>,
    ) -> Self {
        Self {
            runtime,
            project_root,
            requirements,
            repositories,
        }
    }

    /// Collect conflicts for `id`. Repository matches at `own_location` are
    /// not reported. Never mutates anything; an unreadable manifest yields
    /// a log warning and no conflicts.
    #[tracing::instrument(skip(self))]
    pub fn detect(&self, id: &PackageId, own_location: Option<&Path>) -> Vec<Conflict> {
        let mut conflicts = Vec::new();

        match self.requirements.is_required(id) {
            Ok(Some(section)) => conflicts.push(Conflict::AlreadyRequired {
                id: id.clone(),
                section,
            }),
            Ok(None) => {}
            Err(e) => warn!("Skipping requirement check for {}: {:#}", id, e),
        }

        let own = own_location.map(|p| self.canonical(p));
        match self.repositories.find_packages_under(id) {
            Ok(paths) => {
                for path in paths {
                    if own.as_ref() == Some(&self.canonical(&path)) {
                        continue;
                    }
                    conflicts.push(Conflict::ReachableViaRepository {
                        id: id.clone(),
                        path: relative_to_project(self.project_root, &path),
                    });
                }
            }
            Err(e) => warn!("Skipping repository check for {}: {:#}", id, e),
        }

        conflicts
    }

    fn canonical(&self, path: &Path) -> PathBuf {
        self.runtime
            .canonicalize(path)
            .unwrap_or_else(|_| normalize_path(path))
    }
}
