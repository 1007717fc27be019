//! Registry of packages created by this engine.
//!
//! The store is a flat JSON object mapping `vendor/name` to the absolute
//! package directory. Only packages made through the engine are recorded,
//! which is what lets `remove --all` stay away from anything else.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::manifest::to_pretty_json;
use crate::package::PackageId;
use crate::runtime::{Runtime, normalize_separators};

pub struct LocalRegistry<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
}

impl<'a, R: Runtime> LocalRegistry<'a, R> {
    pub fn new(runtime: &'a R, path: PathBuf) -> Self {
        Self { runtime, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All recorded packages. A missing or unreadable store is an empty registry.
    pub fn all(&self) -> BTreeMap<PackageId, PathBuf> {
        self.load()
            .into_iter()
            .map(|(id, path)| (id, PathBuf::from(path)))
            .collect()
    }

    pub fn get(&self, id: &PackageId) -> Option<PathBuf> {
        self.load().remove(id).map(PathBuf::from)
    }

    /// Record `id` at `path`. Returns `false` without writing when the
    /// stored value is already the same path.
    #[tracing::instrument(skip(self))]
    pub fn add(&self, id: &PackageId, path: &Path) -> Result<bool> {
        let normalized = normalize_separators(&path.to_string_lossy());
        let mut data = self.load();
        if data.get(id) == Some(&normalized) {
            debug!("{} already registered at {}", id, normalized);
            return Ok(false);
        }
        data.insert(id.clone(), normalized);
        self.persist(&data)?;
        Ok(true)
    }

    /// Forget `id`. Returns `false` without writing when it was not recorded.
    #[tracing::instrument(skip(self))]
    pub fn remove(&self, id: &PackageId) -> Result<bool> {
        let mut data = self.load();
        if data.remove(id).is_none() {
            return Ok(false);
        }
        self.persist(&data)?;
        Ok(true)
    }

    fn load(&self) -> BTreeMap<PackageId, String> {
        if !self.runtime.is_file(&self.path) {
            return BTreeMap::new();
        }
        let content = match self.runtime.read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("Cannot read registry {:?}: {}", self.path, e);
                return BTreeMap::new();
            }
        };
        let raw: BTreeMap<String, serde_json::Value> = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Ignoring unreadable registry {:?}: {}", self.path, e);
                return BTreeMap::new();
            }
        };

        let mut data = BTreeMap::new();
        for (key, value) in raw {
            match (key.parse::<PackageId>(), value.as_str()) {
                (Ok(id), Some(path)) => {
                    data.insert(id, path.to_string());
                }
                _ => warn!("Ignoring malformed registry entry {:?}", key),
            }
        }
        data
    }

    fn persist(&self, data: &BTreeMap<PackageId, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !self.runtime.exists(parent)
        {
            self.runtime.create_dir_all(parent)?;
        }

        let raw: BTreeMap<String, &String> =
            data.iter().map(|(id, path)| (id.to_string(), path)).collect();
        let content = to_pretty_json(&raw)?;
        self.runtime
            .write(&self.path, content.as_bytes())
            .with_context(|| format!("Failed to save registry to {:?}", self.path))
    }
}
