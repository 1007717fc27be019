//! Package roots and the local packages found under them.
//!
//! Directory structure: `<root>/<vendor>/<name>`. Besides the configured
//! root, packages may live in the conventional `<project>/packages` or in
//! sibling roots such as `packages-legacy`, which is where directories end
//! up after the configured packages path was renamed.

use glob::Pattern;
use log::debug;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::manifest::PackageManifest;
use crate::package::PackageId;
use crate::runtime::{Runtime, normalize_path, normalize_separators};

/// Conventional packages directory name.
pub const CONVENTIONAL_ROOT: &str = "packages";

pub struct PackageRoots<'a, R: Runtime> {
    runtime: &'a R,
    project_root: PathBuf,
    configured_root: PathBuf,
}

impl<'a, R: Runtime> PackageRoots<'a, R> {
    pub fn new(runtime: &'a R, project_root: &Path, configured_root: &Path) -> Self {
        Self {
            runtime,
            project_root: normalize_path(project_root),
            configured_root: normalize_path(configured_root),
        }
    }

    pub fn configured_root(&self) -> &Path {
        &self.configured_root
    }

    /// Existing candidate roots, de-duplicated, in search order.
    pub fn roots(&self) -> Vec<PathBuf> {
        let mut candidates = vec![
            self.configured_root.clone(),
            self.project_root.join(CONVENTIONAL_ROOT),
        ];
        candidates.extend(self.siblings(&self.project_root, CONVENTIONAL_ROOT));
        if let (Some(parent), Some(name)) = (
            self.configured_root.parent(),
            self.configured_root.file_name(),
        ) {
            candidates.extend(self.siblings(parent, &name.to_string_lossy()));
        }

        let mut roots: Vec<PathBuf> = Vec::new();
        for candidate in candidates {
            let candidate = normalize_path(&candidate);
            if !roots.contains(&candidate) && self.runtime.is_dir(&candidate) {
                roots.push(candidate);
            }
        }
        roots
    }

    /// `<dir>/<prefix>*`, sorted.
    fn siblings(&self, dir: &Path, prefix: &str) -> Vec<PathBuf> {
        let dir = normalize_separators(&dir.to_string_lossy());
        let pattern = format!(
            "{}/{}*",
            Pattern::escape(dir.trim_end_matches('/')),
            Pattern::escape(prefix)
        );
        match self.runtime.glob(&pattern) {
            Ok(matches) => matches,
            Err(e) => {
                debug!("Skipping root pattern {:?}: {:#}", pattern, e);
                Vec::new()
            }
        }
    }

    /// Locate the directory of `id` under any root.
    ///
    /// A directory at the expected location wins; otherwise a sibling in the
    /// same vendor directory whose manifest declares `id` is accepted, which
    /// covers packages whose directory was renamed.
    #[tracing::instrument(skip(self))]
    pub fn resolve(&self, id: &PackageId) -> Option<PathBuf> {
        let name = id.to_string();
        for root in self.roots() {
            let expected = id.dir_under(&root);
            if self.runtime.is_dir(&expected) {
                return Some(expected);
            }

            let vendor_dir = root.join(&id.vendor);
            for dir in self.subdirs(&vendor_dir) {
                if PackageManifest::read(self.runtime, &dir).is_some_and(|m| m.declares(&name)) {
                    debug!("Found {} at renamed directory {:?}", name, dir);
                    return Some(dir);
                }
            }
        }
        None
    }

    /// Every package directory under every root. A package is identified by
    /// its manifest name, or by its location when the manifest has none.
    /// The first root wins when the same package appears twice.
    pub fn discover(&self) -> BTreeMap<PackageId, PathBuf> {
        let mut found = BTreeMap::new();
        for root in self.roots() {
            for vendor_dir in self.subdirs(&root) {
                for dir in self.subdirs(&vendor_dir) {
                    let Some(id) = self.identify(&dir) else {
                        debug!("Skipping unidentifiable directory {:?}", dir);
                        continue;
                    };
                    found.entry(id).or_insert(dir);
                }
            }
        }
        found
    }

    fn identify(&self, dir: &Path) -> Option<PackageId> {
        if let Some(name) = PackageManifest::read(self.runtime, dir).and_then(|m| m.name)
            && let Ok(id) = name.parse()
        {
            return Some(id);
        }
        let name = dir.file_name()?.to_string_lossy();
        let vendor = dir.parent()?.file_name()?.to_string_lossy();
        PackageId::new(&vendor, &name).ok()
    }

    fn subdirs(&self, dir: &Path) -> Vec<PathBuf> {
        if !self.runtime.is_dir(dir) {
            return Vec::new();
        }
        let mut dirs: Vec<PathBuf> = match self.runtime.read_dir(dir) {
            Ok(entries) => entries
                .into_iter()
                .filter(|p| self.runtime.is_dir(p))
                .collect(),
            Err(e) => {
                debug!("Cannot read {:?}: {:#}", dir, e);
                Vec::new()
            }
        };
        dirs.sort();
        dirs
    }
}
