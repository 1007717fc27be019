//! Package identifier parsing.

use anyhow::{Result, bail};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A local package identifier in the format `vendor/name`.
///
/// Both parts consist of ASCII letters (either case), digits and `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId {
    pub vendor: String,
    pub name: String,
}

impl PackageId {
    pub fn new(vendor: &str, name: &str) -> Result<Self> {
        if !is_valid_part(vendor) || !is_valid_part(name) {
            bail!(
                "Invalid package name '{}/{}'. Expected 'vendor/package' using letters, digits and '-'.",
                vendor,
                name
            );
        }
        Ok(Self {
            vendor: vendor.to_string(),
            name: name.to_string(),
        })
    }

    /// `<base>/<vendor>/<name>`
    pub fn dir_under(&self, base: &Path) -> PathBuf {
        base.join(&self.vendor).join(&self.name)
    }
}

fn is_valid_part(part: &str) -> bool {
    !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.vendor, self.name)
    }
}

impl FromStr for PackageId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((vendor, name)) if !name.contains('/') => PackageId::new(vendor, name),
            _ => bail!("Invalid package name '{}'. Expected 'vendor/package'.", s),
        }
    }
}
