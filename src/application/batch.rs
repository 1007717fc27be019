//! Target selection and per-package batch execution.

use anyhow::{Result, bail};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::package::PackageId;
use crate::runtime::Runtime;
use crate::tool::ToolRunner;

use super::Workspace;

/// Which packages a command acts on.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Named(Vec<String>),
    All,
}

/// What `--all` expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only packages this engine created. Used by destructive operations.
    Registered,
    /// Registered packages plus every package found under the roots.
    RegisteredAndDiscovered,
}

/// Outcome of a batch: how many items succeeded and which failed.
#[derive(Debug, Default, PartialEq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: Vec<String>,
}

impl BatchReport {
    /// `Err` when any item failed, so the process exits non-zero.
    pub fn into_result(self) -> Result<()> {
        if self.failed.is_empty() {
            return Ok(());
        }
        bail!(
            "{} of {} package(s) failed: {}",
            self.failed.len(),
            self.failed.len() + self.succeeded,
            self.failed.join(", ")
        )
    }
}

impl<R: Runtime, T: ToolRunner> Workspace<'_, R, T> {
    /// Packages `--all` refers to for the given scope.
    pub fn all_targets(&self, scope: Scope) -> BTreeMap<PackageId, PathBuf> {
        let mut targets = self.registry.all();
        if scope == Scope::RegisteredAndDiscovered {
            for (id, path) in self.roots.discover() {
                targets.entry(id).or_insert(path);
            }
        }
        targets
    }

    /// Run `op` for every selected package. Invalid names and failing
    /// items are reported and the batch carries on.
    pub fn run_batch<F>(&self, selection: &Selection, scope: Scope, mut op: F) -> BatchReport
    where
        F: FnMut(&PackageId) -> Result<()>,
    {
        let items: Vec<(String, Result<PackageId>)> = match selection {
            Selection::Named(names) => names.iter().map(|n| (n.clone(), n.parse())).collect(),
            Selection::All => self
                .all_targets(scope)
                .into_keys()
                .map(|id| (id.to_string(), Ok(id)))
                .collect(),
        };
        if items.is_empty() {
            println!("No local packages found.");
        }

        let mut report = BatchReport::default();
        for (label, parsed) in items {
            match parsed.and_then(|id| op(&id)) {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    eprintln!("Error: {}: {:#}", label, e);
                    report.failed.push(label);
                }
            }
        }
        report
    }
}
