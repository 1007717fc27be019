//! Keeps a package in exactly one of `require` / `require-dev`.

use anyhow::Result;
use log::debug;
use std::fmt;

use crate::package::PackageId;
use crate::runtime::Runtime;

use super::ManifestStore;

/// A dependency section of the project manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Require,
    RequireDev,
}

impl Section {
    pub const ALL: [Section; 2] = [Section::Require, Section::RequireDev];

    pub fn for_dev(dev: bool) -> Self {
        if dev {
            Section::RequireDev
        } else {
            Section::Require
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Section::Require => "require",
            Section::RequireDev => "require-dev",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Section::Require => Section::RequireDev,
            Section::RequireDev => Section::Require,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

pub struct RequirementSync<'a, R: Runtime> {
    store: ManifestStore<'a, R>,
}

impl<'a, R: Runtime> RequirementSync<'a, R> {
    pub fn new(store: ManifestStore<'a, R>) -> Self {
        Self { store }
    }

    /// Require `id` at `constraint` in the regular or dev section, moving it
    /// out of the other section if needed. Returns whether the manifest changed.
    #[tracing::instrument(skip(self))]
    pub fn require(&self, id: &PackageId, constraint: &str, dev: bool) -> Result<bool> {
        let name = id.to_string();
        let target = Section::for_dev(dev);
        let other = target.other();
        let mut manifest = self.store.load()?;

        let up_to_date = manifest
            .section(target)
            .and_then(|s| s.get(&name))
            .is_some_and(|current| current == constraint);
        let in_other = manifest.section(other).is_some_and(|s| s.contains(&name));
        if up_to_date && !in_other {
            debug!("{} already requires {}:{}", target, name, constraint);
            return Ok(false);
        }

        if let Some(section) = manifest.section_mut(other)
            && section.remove(&name).is_some()
        {
            println!("Removed {} from {} section", name, other);
        }
        manifest.section_entry(target).insert(&name, constraint);
        self.store.save(&manifest)?;
        println!("Added {}:{} to {} section", name, constraint, target);
        Ok(true)
    }

    /// Remove `id` from every section. Returns the sections it was removed from.
    #[tracing::instrument(skip(self))]
    pub fn remove_requirement(&self, id: &PackageId) -> Result<Vec<Section>> {
        let name = id.to_string();
        let mut manifest = self.store.load()?;
        let mut removed = Vec::new();

        for section in Section::ALL {
            if let Some(deps) = manifest.section_mut(section)
                && deps.remove(&name).is_some()
            {
                removed.push(section);
            }
        }

        if !removed.is_empty() {
            self.store.save(&manifest)?;
            for section in &removed {
                println!("Removed {} from {} section", name, section);
            }
        }
        Ok(removed)
    }

    /// The section currently listing `id`, if any.
    pub fn is_required(&self, id: &PackageId) -> Result<Option<Section>> {
        let name = id.to_string();
        let manifest = self.store.load()?;
        Ok(Section::ALL
            .into_iter()
            .find(|section| manifest.section(*section).is_some_and(|s| s.contains(&name))))
    }
}
