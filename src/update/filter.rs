//! Resolution options and candidate selection
//!
//! This module provides the ResolveOptions struct that encapsulates the
//! knobs of a resolution run, and the candidate filter shared by the
//! resolver and the migration matcher.

use crate::domain::NumericVersion;
use std::cmp::Ordering;

/// Options for a resolution run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Maximum number of dependencies resolved concurrently
    pub parallelism: usize,
    /// Move dependencies to migrated coordinates instead of only reporting them
    pub apply_migrations: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            apply_migrations: false,
        }
    }
}

impl ResolveOptions {
    /// Create options with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrency bound (at least 1)
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Set whether available migrations are applied
    pub fn with_apply_migrations(mut self, apply: bool) -> Self {
        self.apply_migrations = apply;
        self
    }
}

/// Number of available CPU cores, 1 when unknown
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// The greatest candidate `current` may move to, if any
pub fn select_best<'a>(
    current: &NumericVersion,
    candidates: &'a [NumericVersion],
) -> Option<&'a NumericVersion> {
    max_by_order(candidates.iter().filter(|c| current.is_valid_candidate(c)))
}

/// The greatest version under the version ordering; the first one wins ties
pub fn max_by_order<'a, I>(versions: I) -> Option<&'a NumericVersion>
where
    I: IntoIterator<Item = &'a NumericVersion>,
{
    versions.into_iter().fold(None, |best, v| match best {
        Some(b) if v.compare(b) != Ordering::Greater => Some(b),
        _ => Some(v),
    })
}
