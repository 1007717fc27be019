//! Local packages: identity, location, registration and linking.

mod conflicts;
mod id;
mod ignore;
mod link;
mod registry;
mod roots;
mod scaffold;
pub mod version;

pub use conflicts::{Conflict, ConflictDetector};
pub use id::PackageId;
pub use ignore::ensure_ignored;
pub use link::{LinkManager, LinkOutcome, LinkStatus, LinkStrategy, UnlinkOutcome};
pub use registry::LocalRegistry;
pub use roots::PackageRoots;
pub use scaffold::{ManifestScaffolder, Scaffolder};
pub use version::{normalize_branch_base, resolve_branch, to_constraint};

#[cfg(test)]
pub use scaffold::MockScaffolder;
