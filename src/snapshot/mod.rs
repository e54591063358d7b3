//! Resolved dependency snapshots
//!
//! This module provides:
//! - ResolvedDep: a flattened, comparable snapshot entry
//! - Snapshot diffing per logical group
//! - The line-oriented snapshot file format

mod diff;
mod file;

pub use diff::{diff_snapshots, DiffReport, ProjectDiff, UpdatedDep};
pub use file::{append_entries, parse_snapshot, read_snapshot, render_snapshot, write_snapshot};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A resolved dependency as recorded in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResolvedDep {
    pub organization: String,
    pub artifact: String,
    pub version: String,
}

impl ResolvedDep {
    pub fn new(
        organization: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            organization: organization.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }

    /// Identity used for diffing: organization + artifact
    pub fn key(&self) -> (&str, &str) {
        (&self.organization, &self.artifact)
    }
}

impl fmt::Display for ResolvedDep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.organization, self.artifact, self.version)
    }
}

/// Logical group name to the dependencies resolved in it
pub type Snapshot = BTreeMap<String, BTreeSet<ResolvedDep>>;
