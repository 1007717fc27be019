//! Branch and version-constraint normalization.
//!
//! Local packages are always required through a development branch, so a
//! user-supplied value like `dev-feature-x`, `feature-x` or nothing at all is
//! reduced to a branch base (`feature-x`, or the default branch) from which
//! the constraint (`dev-feature-x`) is derived.

/// Branch used when nothing usable was supplied.
pub const DEFAULT_BRANCH: &str = "main";

/// Prefix the dependency manager uses for branch constraints.
pub const DEV_PREFIX: &str = "dev-";

/// Normalize a branch name or branch constraint to its base name.
///
/// Trims whitespace and strips one leading `dev-`. Empty input, or input
/// that is empty after stripping, yields [`DEFAULT_BRANCH`].
pub fn normalize_branch_base(input: &str) -> String {
    let trimmed = input.trim();
    let base = trimmed.strip_prefix(DEV_PREFIX).unwrap_or(trimmed).trim();
    if base.is_empty() {
        DEFAULT_BRANCH.to_string()
    } else {
        base.to_string()
    }
}

/// Build the version constraint for a branch base.
pub fn to_constraint(branch_base: &str) -> String {
    format!("{}{}", DEV_PREFIX, branch_base)
}

/// Branch base and constraint for an optional user value, falling back to
/// the configured default (itself a branch or constraint).
pub fn resolve_branch(requested: Option<&str>, configured_default: &str) -> (String, String) {
    let raw = match requested {
        Some(value) if !value.trim().is_empty() => value,
        _ => configured_default,
    };
    let base = normalize_branch_base(raw);
    let constraint = to_constraint(&base);
    (base, constraint)
}
