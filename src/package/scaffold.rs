//! Initial contents of a newly made package.

use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;

use crate::manifest::{MANIFEST_FILE, to_pretty_json};
use crate::package::PackageId;
use crate::runtime::Runtime;

/// Fills a freshly created package directory.
#[cfg_attr(test, mockall::automock)]
pub trait Scaffolder {
    fn scaffold(&self, id: &PackageId, dir: &Path) -> Result<()>;
}

/// Writes a minimal library manifest with a PSR-4 autoload root at `src/`.
pub struct ManifestScaffolder<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> ManifestScaffolder<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }
}

impl<R: Runtime> Scaffolder for ManifestScaffolder<'_, R> {
    #[tracing::instrument(skip(self))]
    fn scaffold(&self, id: &PackageId, dir: &Path) -> Result<()> {
        let namespace = format!("{}\\{}\\", studly(&id.vendor), studly(&id.name));
        let manifest = json!({
            "name": id.to_string(),
            "description": format!("Local package {}", id),
            "type": "library",
            "autoload": {
                "psr-4": { namespace: "src/" }
            },
            "require": {}
        });

        let src = dir.join("src");
        self.runtime
            .create_dir_all(&src)
            .with_context(|| format!("Failed to create {:?}", src))?;
        let content = to_pretty_json(&manifest)?;
        self.runtime
            .write(&dir.join(MANIFEST_FILE), content.as_bytes())
            .with_context(|| format!("Failed to write package manifest in {:?}", dir))
    }
}

/// `acme-tools` -> `AcmeTools`
fn studly(part: &str) -> String {
    part.split('-')
        .filter(|s| !s.is_empty())
        .map(|s| {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
