//! `path` repository entries of the project manifest.

use anyhow::Result;
use glob::{MatchOptions, Pattern};
use log::debug;
use std::path::{Path, PathBuf};

use crate::package::PackageId;
use crate::runtime::{
    Runtime, normalize_path, normalize_separators, relative_to_project, resolve_project_path,
};

use super::{MANIFEST_FILE, ManifestStore, PackageManifest, RepositoryEntry};

/// Whether a repository url is a glob pattern rather than a plain path.
pub fn is_glob_like(url: &str) -> bool {
    url.contains(['*', '?', '['])
}

/// Canonical form of a repository url for comparison.
fn normalize_url(url: &str) -> String {
    let mut url = normalize_separators(url.trim());
    while let Some(rest) = url.strip_prefix("./") {
        url = rest.to_string();
    }
    url.trim_end_matches('/').to_string()
}

fn glob_covers(pattern: &str, relative: &str) -> bool {
    let options = MatchOptions {
        require_literal_separator: true,
        ..MatchOptions::new()
    };
    match Pattern::new(pattern) {
        Ok(pattern) => pattern.matches_with(relative, options),
        Err(e) => {
            debug!("Ignoring invalid repository pattern {:?}: {}", pattern, e);
            false
        }
    }
}

pub struct RepositoryManager<'a, R: Runtime> {
    runtime: &'a R,
    project_root: PathBuf,
    store: ManifestStore<'a, R>,
}

impl<'a, R: Runtime> RepositoryManager<'a, R> {
    pub fn new(runtime: &'a R, project_root: &Path) -> Self {
        Self {
            runtime,
            project_root: project_root.to_path_buf(),
            store: ManifestStore::new(runtime, project_root.join(MANIFEST_FILE)),
        }
    }

    /// Make sure a `path` entry covers `package_dir`, appending one when
    /// neither an exact nor a glob entry does. Returns whether one was added.
    #[tracing::instrument(skip(self))]
    pub fn ensure(&self, package_dir: &Path) -> Result<bool> {
        let relative = relative_to_project(&self.project_root, package_dir);
        let mut manifest = self.store.load()?;

        let covered = manifest.repositories().iter().filter_map(|e| e.path_url()).any(|url| {
            let url = normalize_url(url);
            url == relative || (is_glob_like(&url) && glob_covers(&url, &relative))
        });
        if covered {
            debug!("Repository entry for {} already present", relative);
            return Ok(false);
        }

        manifest
            .repositories
            .get_or_insert_with(Vec::new)
            .push(RepositoryEntry::path(&relative));
        self.store.save(&manifest)?;
        println!("Added path repository {}", relative);
        Ok(true)
    }

    /// Drop `path` entries whose url is exactly `package_dir`. Glob entries
    /// are shared with other packages and are never removed.
    #[tracing::instrument(skip(self))]
    pub fn remove_by_path(&self, package_dir: &Path) -> Result<bool> {
        let relative = relative_to_project(&self.project_root, package_dir);
        let mut manifest = self.store.load()?;
        let Some(entries) = manifest.repositories.as_mut() else {
            return Ok(false);
        };

        let before = entries.len();
        entries.retain(|entry| {
            entry
                .path_url()
                .is_none_or(|url| is_glob_like(url) || normalize_url(url) != relative)
        });
        if entries.len() == before {
            return Ok(false);
        }

        self.store.save(&manifest)?;
        println!("Removed path repository {}", relative);
        Ok(true)
    }

    /// Whether an exact (non-glob) entry points at `package_dir`.
    pub fn has_exact(&self, package_dir: &Path) -> Result<bool> {
        let relative = relative_to_project(&self.project_root, package_dir);
        let manifest = self.store.load()?;
        Ok(manifest
            .repositories()
            .iter()
            .filter_map(|e| e.path_url())
            .any(|url| !is_glob_like(url) && normalize_url(url) == relative))
    }

    /// Directories reachable through `path` entries whose own manifest
    /// declares `id`, canonicalized and de-duplicated.
    #[tracing::instrument(skip(self))]
    pub fn find_packages_under(&self, id: &PackageId) -> Result<Vec<PathBuf>> {
        let manifest = self.store.load()?;
        let name = id.to_string();
        let mut found = Vec::new();

        for url in manifest.repositories().iter().filter_map(|e| e.path_url()) {
            for candidate in self.expand(url)? {
                self.collect_if_declares(&candidate, &name, &mut found);
                if self.runtime.is_file(&candidate.join(MANIFEST_FILE)) {
                    continue;
                }
                let Ok(children) = self.runtime.read_dir(&candidate) else {
                    continue;
                };
                let mut children: Vec<_> =
                    children.into_iter().filter(|c| self.runtime.is_dir(c)).collect();
                children.sort();
                for child in children {
                    self.collect_if_declares(&child, &name, &mut found);
                }
            }
        }
        Ok(found)
    }

    /// Existing directories a repository url refers to.
    fn expand(&self, url: &str) -> Result<Vec<PathBuf>> {
        let url = normalize_url(url);
        if !is_glob_like(&url) {
            let dir = resolve_project_path(&self.project_root, &url);
            return Ok(if self.runtime.is_dir(&dir) {
                vec![dir]
            } else {
                Vec::new()
            });
        }

        let pattern = if Path::new(&url).is_absolute() {
            url
        } else {
            let root = normalize_separators(&self.project_root.to_string_lossy());
            format!("{}/{}", Pattern::escape(root.trim_end_matches('/')), url)
        };
        Ok(self
            .runtime
            .glob(&pattern)?
            .into_iter()
            .filter(|p| self.runtime.is_dir(p))
            .collect())
    }

    fn collect_if_declares(&self, dir: &Path, name: &str, found: &mut Vec<PathBuf>) {
        let declares = PackageManifest::read(self.runtime, dir).is_some_and(|m| m.declares(name));
        if !declares {
            return;
        }
        let canonical = self
            .runtime
            .canonicalize(dir)
            .unwrap_or_else(|_| normalize_path(dir));
        if !found.contains(&canonical) {
            found.push(canonical);
        }
    }
}
