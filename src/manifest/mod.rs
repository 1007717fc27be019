//! Project manifest (`composer.json`) model and persistence.
//!
//! The manifest is read whole, modified in memory and written back whole.
//! Only the parts the engine edits are typed; everything else is carried
//! through untouched, and the original top-level key order is kept.

mod dependencies;
mod repositories;
mod requirements;

use anyhow::{Context, Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::runtime::Runtime;

pub use dependencies::DependencyMap;
pub use repositories::{RepositoryManager, is_glob_like};
pub use requirements::{RequirementSync, Section};

pub const MANIFEST_FILE: &str = "composer.json";

/// Serialize as 4-space indented JSON with a trailing newline, slashes unescaped.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .context("JSON encoding failed")?;
    let mut content = String::from_utf8(buf).context("JSON encoding produced invalid UTF-8")?;
    content.push('\n');
    Ok(content)
}

/// Options of a path repository entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RepositoryOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symlink: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One element of the manifest's `repositories` list.
///
/// Entries of other types (`vcs`, `composer`, `{"packagist.org": false}`)
/// round-trip through `extra`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RepositoryEntry {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<RepositoryOptions>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RepositoryEntry {
    /// A `path` repository with symlinking enabled.
    pub fn path(url: &str) -> Self {
        Self {
            kind: Some("path".to_string()),
            url: Some(url.to_string()),
            options: Some(RepositoryOptions {
                symlink: Some(true),
                canonical: Some(true),
                extra: Map::new(),
            }),
            extra: Map::new(),
        }
    }

    /// The url of a `path` entry, if this is one.
    pub fn path_url(&self) -> Option<&str> {
        match (self.kind.as_deref(), self.url.as_deref()) {
            (Some("path"), Some(url)) => Some(url),
            _ => None,
        }
    }
}

/// The project manifest.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repositories: Option<Vec<RepositoryEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require: Option<DependencyMap>,
    #[serde(rename = "require-dev", default, skip_serializing_if = "Option::is_none")]
    pub require_dev: Option<DependencyMap>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Top-level key order of the document this was parsed from.
    #[serde(skip)]
    key_order: Vec<String>,
}

impl Manifest {
    pub fn parse(content: &str) -> Result<Self> {
        let document: Map<String, Value> =
            serde_json::from_str(content).context("Manifest is not a JSON object")?;
        if let Some(repositories) = document.get("repositories")
            && !repositories.is_array()
        {
            bail!("Manifest 'repositories' must be a list of repository entries");
        }
        let key_order = document.keys().cloned().collect();
        let mut manifest: Manifest = serde_json::from_value(Value::Object(document))
            .context("Manifest has an unexpected shape")?;
        manifest.key_order = key_order;
        Ok(manifest)
    }

    /// Render the whole document, keeping the original key order and
    /// appending keys that did not exist before.
    pub fn render(&self) -> Result<String> {
        let Value::Object(mut fields) = serde_json::to_value(self)? else {
            bail!("Manifest did not serialize to an object");
        };
        let mut ordered = Map::new();
        for key in &self.key_order {
            if let Some(value) = fields.remove(key) {
                ordered.insert(key.clone(), value);
            }
        }
        ordered.extend(fields);
        to_pretty_json(&ordered)
    }

    pub fn repositories(&self) -> &[RepositoryEntry] {
        self.repositories.as_deref().unwrap_or_default()
    }

    pub fn section(&self, section: Section) -> Option<&DependencyMap> {
        match section {
            Section::Require => self.require.as_ref(),
            Section::RequireDev => self.require_dev.as_ref(),
        }
    }

    pub fn section_mut(&mut self, section: Section) -> Option<&mut DependencyMap> {
        match section {
            Section::Require => self.require.as_mut(),
            Section::RequireDev => self.require_dev.as_mut(),
        }
    }

    /// The section, created empty when absent.
    pub fn section_entry(&mut self, section: Section) -> &mut DependencyMap {
        match section {
            Section::Require => self.require.get_or_insert_with(DependencyMap::default),
            Section::RequireDev => self.require_dev.get_or_insert_with(DependencyMap::default),
        }
    }
}

/// Loads and saves the project manifest through the runtime.
pub struct ManifestStore<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
}

impl<'a, R: Runtime> ManifestStore<'a, R> {
    pub fn new(runtime: &'a R, path: PathBuf) -> Self {
        Self { runtime, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> Result<Manifest> {
        let content = self
            .runtime
            .read_to_string(&self.path)
            .with_context(|| format!("Failed to read manifest {:?}", self.path))?;
        Manifest::parse(&content).with_context(|| format!("Invalid manifest {:?}", self.path))
    }

    #[tracing::instrument(skip(self, manifest))]
    pub fn save(&self, manifest: &Manifest) -> Result<()> {
        let content = manifest.render()?;
        debug!("Writing manifest {:?}", self.path);
        self.runtime
            .write(&self.path, content.as_bytes())
            .with_context(|| format!("Failed to save manifest to {:?}", self.path))
    }
}

/// The two fields of a package's own manifest the engine cares about.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl PackageManifest {
    /// Read `<dir>/composer.json`. Missing or unparsable manifests yield `None`.
    pub fn read<R: Runtime>(runtime: &R, dir: &Path) -> Option<Self> {
        let path = dir.join(MANIFEST_FILE);
        if !runtime.is_file(&path) {
            return None;
        }
        let content = runtime.read_to_string(&path).ok()?;
        match serde_json::from_str(&content) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                debug!("Ignoring unparsable package manifest {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn declares(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}
