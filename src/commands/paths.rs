use anyhow::{Result, bail};
use log::debug;
use std::path::{Path, PathBuf};

use crate::manifest::MANIFEST_FILE;
use crate::runtime::{Runtime, normalize_path};

/// Locate the project root: the explicit path if given (relative to the
/// current directory), otherwise the nearest ancestor of the current
/// directory that holds a project manifest.
#[tracing::instrument(skip(runtime))]
pub fn find_project_root<R: Runtime>(runtime: &R, explicit: Option<&Path>) -> Result<PathBuf> {
    let cwd = runtime.current_dir()?;

    if let Some(path) = explicit {
        let root = normalize_path(&cwd.join(path));
        if !runtime.is_file(&root.join(MANIFEST_FILE)) {
            bail!("No {} found in project root {}", MANIFEST_FILE, root.display());
        }
        return Ok(root);
    }

    for dir in cwd.ancestors() {
        if runtime.is_file(&dir.join(MANIFEST_FILE)) {
            debug!("Using project root {:?}", dir);
            return Ok(dir.to_path_buf());
        }
    }
    bail!(
        "No {} found in {} or any parent directory. Use --project-root to point at the project.",
        MANIFEST_FILE,
        cwd.display()
    )
}
