//! Snapshot diffing
//!
//! Compares two snapshots group by group. Entries are identified by
//! organization + artifact; only changes are reported.

use super::{ResolvedDep, Snapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A dependency whose version changed between two snapshots
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct UpdatedDep {
    pub organization: String,
    pub artifact: String,
    pub from: String,
    pub to: String,
}

/// Changes within one logical group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectDiff {
    pub updated: Vec<UpdatedDep>,
    pub added: Vec<ResolvedDep>,
    pub removed: Vec<ResolvedDep>,
}

impl ProjectDiff {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.added.is_empty() && self.removed.is_empty()
    }

    /// Total number of changes
    pub fn len(&self) -> usize {
        self.updated.len() + self.added.len() + self.removed.len()
    }
}

/// Diff of two snapshots, ready for serialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    pub generated_at: DateTime<Utc>,
    pub groups: BTreeMap<String, ProjectDiff>,
}

impl DiffReport {
    pub fn new(before: &Snapshot, after: &Snapshot) -> Self {
        Self {
            generated_at: Utc::now(),
            groups: diff_snapshots(before, after),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Per-group additions, removals and updates; unchanged groups are omitted
pub fn diff_snapshots(before: &Snapshot, after: &Snapshot) -> BTreeMap<String, ProjectDiff> {
    let empty = BTreeSet::new();
    let groups: BTreeSet<&String> = before.keys().chain(after.keys()).collect();

    groups
        .into_iter()
        .filter_map(|group| {
            let diff = diff_group(
                before.get(group).unwrap_or(&empty),
                after.get(group).unwrap_or(&empty),
            );
            (!diff.is_empty()).then(|| (group.clone(), diff))
        })
        .collect()
}

fn by_key(entries: &BTreeSet<ResolvedDep>) -> BTreeMap<(&str, &str), Vec<&ResolvedDep>> {
    let mut grouped: BTreeMap<(&str, &str), Vec<&ResolvedDep>> = BTreeMap::new();
    for entry in entries {
        grouped.entry(entry.key()).or_default().push(entry);
    }
    grouped
}

/// One version on each side is an update. Several versions of the same
/// artifact are compared as sets: versions on one side only are added or removed.
fn diff_group(before: &BTreeSet<ResolvedDep>, after: &BTreeSet<ResolvedDep>) -> ProjectDiff {
    let before = by_key(before);
    let after = by_key(after);
    let keys: BTreeSet<&(&str, &str)> = before.keys().chain(after.keys()).collect();
    let mut diff = ProjectDiff::default();

    for key in keys {
        let old = before.get(key).map(Vec::as_slice).unwrap_or_default();
        let new = after.get(key).map(Vec::as_slice).unwrap_or_default();
        match (old, new) {
            ([old], [new]) => {
                if old.version != new.version {
                    diff.updated.push(UpdatedDep {
                        organization: old.organization.clone(),
                        artifact: old.artifact.clone(),
                        from: old.version.clone(),
                        to: new.version.clone(),
                    });
                }
            }
            _ => {
                diff.removed
                    .extend(old.iter().filter(|e| !new.contains(e)).map(|e| (*e).clone()));
                diff.added
                    .extend(new.iter().filter(|e| !old.contains(e)).map(|e| (*e).clone()));
            }
        }
    }
    diff
}
