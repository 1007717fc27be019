use anyhow::{Context, Result};
use std::path::Path;

use crate::runtime::Runtime;

pub const IGNORE_FILE: &str = ".gitignore";

/// Append `pattern` to `<project>/.gitignore` unless an equivalent line is
/// already present. Lines compare trimmed and without leading/trailing `/`.
/// Returns whether the file was changed.
#[tracing::instrument(skip(runtime))]
pub fn ensure_ignored<R: Runtime>(runtime: &R, project_root: &Path, pattern: &str) -> Result<bool> {
    let path = project_root.join(IGNORE_FILE);
    let key = |line: &str| line.trim().trim_matches('/').to_string();
    let wanted = key(pattern);

    let mut content = if runtime.is_file(&path) {
        runtime
            .read_to_string(&path)
            .with_context(|| format!("Failed to read {:?}", path))?
    } else {
        String::new()
    };
    if content.lines().any(|line| key(line) == wanted) {
        return Ok(false);
    }

    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(pattern.trim());
    content.push('\n');
    runtime
        .write(&path, content.as_bytes())
        .with_context(|| format!("Failed to update {:?}", path))?;
    println!("Added {} to {}", pattern.trim(), IGNORE_FILE);
    Ok(true)
}
