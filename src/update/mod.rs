//! Update resolution for dependencies
//!
//! This module provides:
//! - Resolution options and candidate selection
//! - Coordinate migration matching
//! - The resolver that picks the best allowed version per dependency and
//!   resolves many dependencies concurrently

mod filter;
mod migration;

pub use filter::{default_parallelism, max_by_order, select_best, ResolveOptions};
pub use migration::{MigrationCandidate, MigrationMatcher};

use crate::domain::{marker_accepts, Dependency, Marker, NumericVersion, RetractedArtifact, Version};
use crate::error::ResolutionError;
use crate::registry::{Pipeline, VersionSource};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Outcome of resolving one dependency
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Resolution {
    /// The dependency has a numeric version and was resolved
    Resolved {
        original: Dependency,
        updated: Dependency,
        /// Retraction covering the declared version
        #[serde(skip_serializing_if = "Option::is_none")]
        retracted: Option<RetractedArtifact>,
        #[serde(skip_serializing_if = "Option::is_none")]
        migration: Option<MigrationCandidate>,
    },
    /// The version is a variable; resolving it is up to the caller
    Deferred { dependency: Dependency },
}

impl Resolution {
    fn unchanged(dependency: &Dependency, retracted: Option<RetractedArtifact>) -> Self {
        Resolution::Resolved {
            original: dependency.clone(),
            updated: dependency.clone(),
            retracted,
            migration: None,
        }
    }

    /// The dependency as declared
    pub fn original(&self) -> &Dependency {
        match self {
            Resolution::Resolved { original, .. } => original,
            Resolution::Deferred { dependency } => dependency,
        }
    }

    /// The dependency after resolution (the declared one when deferred)
    pub fn updated(&self) -> &Dependency {
        match self {
            Resolution::Resolved { updated, .. } => updated,
            Resolution::Deferred { dependency } => dependency,
        }
    }

    /// Whether resolution changed the version or the coordinates
    pub fn is_updated(&self) -> bool {
        match self {
            Resolution::Resolved {
                original, updated, ..
            } => original != updated,
            Resolution::Deferred { .. } => false,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Resolution::Deferred { .. })
    }

    pub fn retraction(&self) -> Option<&RetractedArtifact> {
        match self {
            Resolution::Resolved { retracted, .. } => retracted.as_ref(),
            Resolution::Deferred { .. } => None,
        }
    }

    pub fn migration(&self) -> Option<&MigrationCandidate> {
        match self {
            Resolution::Resolved { migration, .. } => migration.as_ref(),
            Resolution::Deferred { .. } => None,
        }
    }

    /// A migration is available but was not applied
    pub fn has_pending_migration(&self) -> bool {
        self.migration().is_some_and(|m| !m.applied)
    }
}

/// Picks the best allowed version for dependencies
#[derive(Clone)]
pub struct UpdateResolver {
    pipeline: Arc<Pipeline>,
    migrations: MigrationMatcher,
    options: ResolveOptions,
}

impl UpdateResolver {
    pub fn new(pipeline: Arc<Pipeline>, options: ResolveOptions) -> Self {
        Self {
            pipeline,
            migrations: MigrationMatcher::default(),
            options,
        }
    }

    /// Check matching migrations while resolving
    pub fn with_migrations(mut self, migrations: MigrationMatcher) -> Self {
        self.migrations = migrations;
        self
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Resolve a single dependency.
    ///
    /// Exact versions are returned unchanged without consulting the index;
    /// a retraction covering them is still reported.
    /// Fails with NoValidVersion when nothing acceptable is published.
    pub async fn resolve(&self, dependency: &Dependency) -> Result<Resolution, ResolutionError> {
        let current = match &dependency.version {
            Version::Variable { .. } => {
                tracing::debug!("{}: variable version, deferred", dependency);
                return Ok(Resolution::Deferred {
                    dependency: dependency.clone(),
                });
            }
            Version::Numeric(current) => current,
        };

        let coordinates = &dependency.coordinates;
        let retracted = self.pipeline.retraction_for(coordinates, current).cloned();
        if let Some(ref retraction) = retracted {
            tracing::warn!(
                "{} {} is retracted{}",
                coordinates,
                current.plain(),
                retraction
                    .reason
                    .as_deref()
                    .map(|r| format!(": {}", r))
                    .unwrap_or_default()
            );
        }

        if current.marker() == Marker::Exact {
            return Ok(Resolution::unchanged(dependency, retracted));
        }

        let versions = self.pipeline.find(coordinates, dependency.is_plugin).await?;

        let best = select_best(current, &versions).map(|v| v.clone().with_marker(current.marker()));
        let mut migration = self
            .migrations
            .check(self.pipeline.as_ref(), dependency, current)
            .await?;

        let updated = match (&mut migration, best) {
            (Some(candidate), _) if self.options.apply_migrations => {
                candidate.applied = true;
                let marker = migrated_marker(current, &candidate.version);
                if marker != current.marker() {
                    tracing::warn!(
                        "{}: {} lies outside the {} lock, applied without it",
                        candidate.to,
                        candidate.version.plain(),
                        current
                    );
                }
                dependency.moved(
                    candidate.to.clone(),
                    Version::Numeric(candidate.version.clone().with_marker(marker)),
                )
            }
            (_, Some(best)) => dependency.with_version(Version::Numeric(best)),
            (Some(_), None) => dependency.clone(),
            (None, None) => {
                return Err(ResolutionError::no_valid_version(coordinates, current));
            }
        };

        if updated != *dependency {
            tracing::debug!("{} -> {}", dependency, updated.version);
        }

        Ok(Resolution::Resolved {
            original: dependency.clone(),
            updated,
            retracted,
            migration,
        })
    }

    /// Resolve every dependency; results are in input order
    pub async fn resolve_all(
        &self,
        dependencies: &[Dependency],
    ) -> Result<Vec<Resolution>, ResolutionError> {
        self.resolve_all_until(dependencies, std::future::pending(), |_| {})
            .await
    }

    /// Resolve every dependency concurrently until `shutdown` completes.
    ///
    /// Either every dependency resolves or the whole run fails: the first
    /// error, or `Cancelled` when `shutdown` fires first, aborts the tasks
    /// still in flight. `on_done` is called once per finished dependency.
    pub async fn resolve_all_until<S, F>(
        &self,
        dependencies: &[Dependency],
        shutdown: S,
        mut on_done: F,
    ) -> Result<Vec<Resolution>, ResolutionError>
    where
        S: Future<Output = ()>,
        F: FnMut(&Resolution),
    {
        let semaphore = Arc::new(Semaphore::new(self.options.parallelism.max(1)));
        let mut tasks = JoinSet::new();

        for (index, dependency) in dependencies.iter().cloned().enumerate() {
            let resolver = self.clone();
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| ResolutionError::Cancelled)?;
                resolver
                    .resolve(&dependency)
                    .await
                    .map(|resolution| (index, resolution))
            });
        }

        let mut results: Vec<Option<Resolution>> = dependencies.iter().map(|_| None).collect();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tasks.abort_all();
                    tracing::warn!("resolution cancelled");
                    return Err(ResolutionError::Cancelled);
                }
                joined = tasks.join_next() => match joined {
                    None => break,
                    Some(Ok(Ok((index, resolution)))) => {
                        on_done(&resolution);
                        results[index] = Some(resolution);
                    }
                    Some(Ok(Err(e))) => {
                        tasks.abort_all();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        tasks.abort_all();
                        return Err(ResolutionError::task(e.to_string()));
                    }
                },
            }
        }

        results
            .into_iter()
            .map(|r| r.ok_or_else(|| ResolutionError::task("dependency left unresolved")))
            .collect()
    }
}

/// Marker carried over to a migrated version: kept when the version still
/// satisfies it, dropped otherwise
fn migrated_marker(current: &NumericVersion, target: &NumericVersion) -> Marker {
    if marker_accepts(current.marker(), current.parts(), target.parts()) {
        current.marker()
    } else {
        Marker::NoMarker
    }
}
