use anyhow::Result;
use std::path::PathBuf;

use crate::manifest::{PackageManifest, Section};
use crate::package::{LinkStatus, PackageId};
use crate::runtime::Runtime;
use crate::tool::ToolRunner;

use super::{Scope, Workspace};

/// One row of `list`.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageSummary {
    pub id: PackageId,
    pub path: PathBuf,
    /// `version` from the package's own manifest.
    pub version: Option<String>,
    pub section: Option<Section>,
    pub link: LinkStatus,
    /// An exact (non-glob) path repository entry points at `path`.
    pub exact_repository: bool,
    /// Created by this engine.
    pub registered: bool,
}

impl PackageSummary {
    fn line(&self, display_path: &str) -> String {
        let mut line = format!("{} {}", self.id, self.version.as_deref().unwrap_or("-"));
        line.push_str(&format!("  [{}]", display_path));
        match self.section {
            Some(section) => line.push_str(&format!("  {}", section)),
            None => line.push_str("  not required"),
        }
        line.push_str(&format!(", {}", self.link.describe()));
        if self.exact_repository {
            line.push_str(", path repository");
        }
        if !self.registered {
            line.push_str(", unregistered");
        }
        line
    }
}

impl<R: Runtime, T: ToolRunner> Workspace<'_, R, T> {
    /// Collect every local package the engine knows of.
    #[tracing::instrument(skip(self))]
    pub fn summaries(&self) -> Result<Vec<PackageSummary>> {
        let registered = self.registry.all();
        let mut summaries = Vec::new();
        for (id, path) in self.all_targets(Scope::RegisteredAndDiscovered) {
            let version = PackageManifest::read(self.runtime, &path).and_then(|m| m.version);
            summaries.push(PackageSummary {
                section: self.requirements.is_required(&id)?,
                link: self.links.status(&id, &path),
                exact_repository: self.repositories.has_exact(&path)?,
                registered: registered.contains_key(&id),
                version,
                path,
                id,
            });
        }
        Ok(summaries)
    }

    /// Print the local packages, one per line.
    pub fn list(&self) -> Result<Vec<PackageSummary>> {
        let summaries = self.summaries()?;
        if summaries.is_empty() {
            println!("No local packages found.");
        }
        for summary in &summaries {
            println!("{}", summary.line(&self.display_path(&summary.path)));
        }
        Ok(summaries)
    }
}
