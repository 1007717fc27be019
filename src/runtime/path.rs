//! Path arithmetic: normalization, project-relative conversion, separators.
//!
//! Nothing in here touches the file system.

use std::path::{Component, Path, PathBuf};

/// Normalize a path by processing `.` and `..` components lexically.
/// This does not access the filesystem and does not follow symlinks.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push(component);
                }
            }
            _ => {
                result.push(component);
            }
        }
    }
    result
}

/// Check if a path is under a given directory by comparing normalized path components.
/// Returns true if `path` is under `dir` (i.e., `dir` is a prefix of `path`).
///
/// `/project/packages/../../etc` is NOT under `/project`.
pub fn is_path_under(path: &Path, dir: &Path) -> bool {
    let normalized_path = normalize_path(path);
    let normalized_dir = normalize_path(dir);

    let path_components: Vec<_> = normalized_path.components().collect();
    let dir_components: Vec<_> = normalized_dir.components().collect();

    if path_components.len() < dir_components.len() {
        return false;
    }

    dir_components
        .iter()
        .zip(path_components.iter())
        .all(|(d, p)| d == p)
}

/// Calculate the relative path from a symlink location to a target.
///
/// For a link at `/project/vendor/acme/widget` pointing to
/// `/project/packages/acme/widget`, this returns `../../packages/acme/widget`.
///
/// Returns `None` if a relative path cannot be computed (e.g., different drive letters on Windows).
pub fn relative_symlink_path(from_link: &Path, to_target: &Path) -> Option<PathBuf> {
    let from_dir = from_link.parent()?;
    let result = pathdiff::diff_paths(to_target, from_dir)?;

    if result.is_absolute() {
        return None;
    }

    Some(result)
}

/// Replace Windows separators with forward slashes.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Express `path` relative to the project root using forward slashes.
///
/// Returns `"."` for the root itself. Paths outside the root are returned
/// whole (separator-normalized) since no relative form exists for them.
pub fn relative_to_project(project_root: &Path, path: &Path) -> String {
    let root = normalize_path(project_root);
    let target = normalize_path(path);

    if target == root {
        return ".".to_string();
    }

    match target.strip_prefix(&root) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => normalize_separators(&target.to_string_lossy()),
    }
}

/// Resolve a project-relative path (as stored in the manifest) to an absolute path.
/// Absolute inputs are returned normalized.
pub fn resolve_project_path(project_root: &Path, relative: &str) -> PathBuf {
    let relative = normalize_separators(relative);
    let candidate = Path::new(&relative);
    if candidate.is_absolute() {
        return normalize_path(candidate);
    }
    let mut joined = project_root.to_path_buf();
    for part in relative.split('/').filter(|p| !p.is_empty()) {
        joined.push(part);
    }
    normalize_path(&joined)
}
