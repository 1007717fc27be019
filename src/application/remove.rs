use anyhow::{Context, Result};
use log::debug;
use std::path::{Path, PathBuf};

use crate::package::PackageId;
use crate::runtime::Runtime;
use crate::tool::ToolRunner;

use super::{MakeOptions, Workspace};

impl<R: Runtime, T: ToolRunner> Workspace<'_, R, T> {
    /// Remove a package from the project entirely: dependency, link,
    /// repository entry, directory (unless `keep_dir`) and registration.
    #[tracing::instrument(skip(self))]
    pub fn remove(&self, id: &PackageId, keep_dir: bool) -> Result<()> {
        if self.requirements.is_required(id)?.is_some() {
            println!("Running composer remove {} ...", id);
            self.report_composer("remove", id, self.composer.remove(id));
        }
        // composer may have failed or left the entry behind
        self.requirements.remove_requirement(id)?;

        self.links.remove(id)?;

        let registered = self.registry.get(id);
        let dir = registered
            .clone()
            .filter(|p| self.runtime.is_dir(p))
            .or_else(|| self.find_in_roots(id));

        let mut entry_paths: Vec<PathBuf> = Vec::new();
        for path in [registered, dir.clone()].into_iter().flatten() {
            if !entry_paths.contains(&path) {
                entry_paths.push(path);
            }
        }
        if entry_paths.is_empty() {
            entry_paths.push(id.dir_under(&self.config.packages_root));
        }
        for path in &entry_paths {
            self.repositories.remove_by_path(path)?;
        }

        match dir {
            Some(dir) if keep_dir => println!("Kept directory {}", self.display_path(&dir)),
            Some(dir) => self.delete_package_dir(&dir)?,
            None => debug!("No directory found for {}", id),
        }

        self.registry.remove(id)?;
        println!("Removed {}", id);
        Ok(())
    }

    /// Remove the package (deleting its directory) and make it afresh.
    #[tracing::instrument(skip(self))]
    pub fn remake(&self, id: &PackageId, options: &MakeOptions) -> Result<()> {
        self.remove(id, false)?;
        self.make(id, options)
    }

    fn delete_package_dir(&self, dir: &Path) -> Result<()> {
        self.runtime
            .remove_dir_all(dir)
            .with_context(|| format!("Failed to delete {}", self.display_path(dir)))?;
        println!("Deleted {}", self.display_path(dir));

        if let Some(vendor_dir) = dir.parent()
            && self.runtime.is_dir(vendor_dir)
            && self.runtime.read_dir(vendor_dir)?.is_empty()
        {
            self.runtime.remove_dir(vendor_dir)?;
            debug!("Pruned empty vendor directory {:?}", vendor_dir);
        }
        Ok(())
    }
}
