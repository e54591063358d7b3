//! Coordinate migrations
//!
//! Detects dependencies whose artifact moved to new coordinates and whether
//! the new coordinates publish something newer than what is declared.

use super::filter::max_by_order;
use crate::domain::{ArtifactMigration, Coordinates, Dependency, NumericVersion};
use crate::error::ResolutionError;
use crate::registry::VersionSource;
use serde::Serialize;
use std::cmp::Ordering;
use std::sync::Arc;

/// A migration that would move a dependency to a strictly newer version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationCandidate {
    /// Coordinates currently declared
    pub from: Coordinates,
    /// Coordinates the artifact moved to
    pub to: Coordinates,
    /// Best version published under the new coordinates
    pub version: NumericVersion,
    /// Whether the dependency was actually moved
    pub applied: bool,
}

/// Matches dependencies against the loaded migration table
#[derive(Debug, Clone, Default)]
pub struct MigrationMatcher {
    migrations: Arc<[ArtifactMigration]>,
}

impl MigrationMatcher {
    pub fn new(migrations: Vec<ArtifactMigration>) -> Self {
        Self {
            migrations: migrations.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// First migration matching `coordinates`, skipping moves onto themselves
    pub fn find(&self, coordinates: &Coordinates) -> Option<&ArtifactMigration> {
        self.migrations
            .iter()
            .find(|m| m.matches(coordinates) && !m.is_target(coordinates))
    }

    /// Looks up the new coordinates of a matching migration and reports it
    /// when they carry a version strictly newer than `current`.
    ///
    /// Candidates only need the same suffix type as `current`; the part count
    /// and the marker are not enforced across a move.
    pub async fn check(
        &self,
        source: &dyn VersionSource,
        dependency: &Dependency,
        current: &NumericVersion,
    ) -> Result<Option<MigrationCandidate>, ResolutionError> {
        let Some(migration) = self.find(&dependency.coordinates) else {
            return Ok(None);
        };

        let target = migration.target(&dependency.coordinates);
        let versions = source.find(&target, dependency.is_plugin).await?;
        let suffix_type = current.suffix_type();
        let best = max_by_order(versions.iter().filter(|v| v.suffix_type() == suffix_type));

        match best {
            Some(version) if version.compare(current) == Ordering::Greater => {
                tracing::info!(
                    "{} moved to {} (latest {})",
                    dependency.coordinates,
                    target,
                    version
                );
                Ok(Some(MigrationCandidate {
                    from: dependency.coordinates.clone(),
                    to: target,
                    version: version.clone(),
                    applied: false,
                }))
            }
            _ => {
                tracing::debug!(
                    "{} matches a migration but {} has nothing newer",
                    dependency.coordinates,
                    target
                );
                Ok(None)
            }
        }
    }
}
