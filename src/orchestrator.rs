//! Resolution orchestrator
//!
//! This module provides:
//! - Workflow coordination: load policies → build pipeline → resolve → report
//! - Run-scoped policy cache and version cache
//! - Dependency document loading
//! - The ResolveReport consumed by the output formatters

use crate::config::EngineConfig;
use crate::domain::{Dependency, DependencyRecord};
use crate::error::{AppError, ConfigError};
use crate::policy::{PolicyCache, PolicyLoader};
use crate::progress::Progress;
use crate::registry::{HttpClient, MavenCentralSource, Pipeline, VersionSource};
use crate::snapshot::Snapshot;
use crate::update::{MigrationMatcher, Resolution, ResolveOptions, UpdateResolver};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// A dependency together with the logical group it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedDependency {
    pub group: String,
    pub dependency: Dependency,
}

/// Parse a JSON array of dependency records
pub fn parse_dependencies(source: &str, text: &str) -> Result<Vec<GroupedDependency>, ConfigError> {
    let records: Vec<DependencyRecord> =
        serde_json::from_str(text).map_err(|e| ConfigError::file(source, e.to_string()))?;
    records
        .into_iter()
        .map(|record| {
            record
                .into_dependency()
                .map(|(group, dependency)| GroupedDependency { group, dependency })
        })
        .collect()
}

/// Read a dependency document from disk
pub fn read_dependencies(path: &Path) -> Result<Vec<GroupedDependency>, ConfigError> {
    let text =
        std::fs::read_to_string(path).map_err(|e| ConfigError::file(path, e.to_string()))?;
    parse_dependencies(&path.display().to_string(), &text)
}

/// Resolution of one dependency within its group
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub group: String,
    pub resolution: Resolution,
}

/// Result of a resolution run, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveReport {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<ReportEntry>,
}

/// Counts over a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveSummary {
    pub total: usize,
    pub updated: usize,
    pub up_to_date: usize,
    pub deferred: usize,
    pub retracted: usize,
    pub pending_migrations: usize,
}

impl ResolveReport {
    pub fn new(entries: Vec<ReportEntry>) -> Self {
        Self {
            generated_at: Utc::now(),
            entries,
        }
    }

    pub fn summary(&self) -> ResolveSummary {
        let mut summary = ResolveSummary {
            total: self.entries.len(),
            ..Default::default()
        };
        for entry in &self.entries {
            let resolution = &entry.resolution;
            if resolution.is_deferred() {
                summary.deferred += 1;
            } else if resolution.is_updated() {
                summary.updated += 1;
            } else {
                summary.up_to_date += 1;
            }
            if resolution.retraction().is_some() {
                summary.retracted += 1;
            }
            if resolution.has_pending_migration() {
                summary.pending_migrations += 1;
            }
        }
        summary
    }

    /// Whether some migration was found but not applied
    pub fn has_pending_migrations(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.resolution.has_pending_migration())
    }

    /// Resolved dependencies per group; deferred ones are left out
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::new();
        for entry in &self.entries {
            if let Some(resolved) = entry.resolution.updated().to_resolved() {
                snapshot
                    .entry(entry.group.clone())
                    .or_default()
                    .insert(resolved);
            }
        }
        snapshot
    }
}

/// Coordinates a resolution run
pub struct Orchestrator {
    config: EngineConfig,
    client: HttpClient,
    source: Arc<dyn VersionSource>,
    show_progress: bool,
}

impl Orchestrator {
    /// Create an orchestrator querying Maven Central (or the configured index)
    pub fn new(config: EngineConfig) -> Result<Self, AppError> {
        let client = HttpClient::with_timeout(config.timeout)?;
        let mut maven = MavenCentralSource::new(client.clone(), config.binary_versions());
        if let Some(ref url) = config.index_url {
            maven = maven.with_base_url(url.clone());
        }
        Ok(Self {
            config,
            client,
            source: Arc::new(maven),
            show_progress: false,
        })
    }

    /// Create an orchestrator over a custom version source (for testing)
    pub fn with_source(config: EngineConfig, source: Arc<dyn VersionSource>) -> Result<Self, AppError> {
        let client = HttpClient::with_timeout(config.timeout)?;
        Ok(Self {
            config,
            client,
            source,
            show_progress: false,
        })
    }

    /// Show progress on stderr while running
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run to completion
    pub async fn run(&self, dependencies: Vec<GroupedDependency>) -> Result<ResolveReport, AppError> {
        self.run_until(dependencies, std::future::pending()).await
    }

    /// Run until done or until `shutdown` completes, whichever comes first
    pub async fn run_until<S>(
        &self,
        dependencies: Vec<GroupedDependency>,
        shutdown: S,
    ) -> Result<ResolveReport, AppError>
    where
        S: Future<Output = ()>,
    {
        let mut progress = Progress::new(self.show_progress);

        // Policies live exactly as long as this run.
        let cache = PolicyCache::new();
        progress.spinner("Loading policies...");
        let policies = PolicyLoader::new(self.client.clone())
            .load_all(&cache, &self.config.policies)
            .await;
        progress.finish_and_clear();
        let policies = policies?;
        tracing::debug!(
            "policies: {} migration(s), {} retraction(s), {} pin(s), {} ignore(s)",
            policies.migrations.len(),
            policies.retractions.len(),
            policies.pins.len(),
            policies.ignores.len()
        );

        let pipeline = Pipeline::builder(Arc::clone(&self.source))
            .timeout(self.config.timeout)
            .ignores(policies.ignores)
            .retractions(policies.retractions)
            .pins(policies.pins)
            .build();
        let options = ResolveOptions::new()
            .with_parallelism(self.config.parallelism)
            .with_apply_migrations(self.config.apply_migrations);
        let resolver = UpdateResolver::new(Arc::new(pipeline), options)
            .with_migrations(MigrationMatcher::new(policies.migrations));

        let (groups, deps): (Vec<String>, Vec<Dependency>) = dependencies
            .into_iter()
            .map(|d| (d.group, d.dependency))
            .unzip();

        progress.start(deps.len() as u64, "Resolving");
        let resolutions = resolver
            .resolve_all_until(&deps, shutdown, |_| progress.inc())
            .await;
        progress.finish_and_clear();

        let entries = groups
            .into_iter()
            .zip(resolutions?)
            .map(|(group, resolution)| ReportEntry { group, resolution })
            .collect();
        Ok(ResolveReport::new(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinates, Version};
    use crate::error::ResolutionError;
    use crate::registry::testing::FakeSource;
    use std::fs;
    use tempfile::TempDir;

    fn grouped(group: &str, org: &str, artifact: &str, version: &str) -> GroupedDependency {
        GroupedDependency {
            group: group.to_string(),
            dependency: Dependency::new(
                Coordinates::new(org, artifact),
                Version::parse(version).unwrap(),
            ),
        }
    }

    fn source() -> Arc<FakeSource> {
        Arc::new(
            FakeSource::new()
                .with(Coordinates::new("org.slf4j", "slf4j-api"), &["2.0.9", "2.0.12"])
                .with(Coordinates::new("com.geirsson", "scalafmt"), &["1.5.1"])
                .with(Coordinates::new("org.scalameta", "scalafmt"), &["3.7.17"]),
        )
    }

    #[test]
    fn test_parse_dependencies() {
        let text = r#"[
            {"organization": "org.typelevel", "artifact": "cats-core", "version": "2.9.0", "cross": true, "group": "core"},
            {"organization": "org.scalameta", "artifact": "sbt-scalafmt", "version": "2.5.0", "plugin": true},
            {"organization": "io.circe", "artifact": "circe-core", "version": "$circeVersion", "configuration": "test"}
        ]"#;
        let deps = parse_dependencies("deps.json", text).unwrap();
        assert_eq!(deps.len(), 3);
        assert_eq!(deps[0].group, "core");
        assert!(deps[0].dependency.coordinates.is_cross);
        assert_eq!(deps[1].group, "default");
        assert!(deps[1].dependency.is_plugin);
        assert!(matches!(deps[2].dependency.version, Version::Variable { .. }));
        assert_eq!(deps[2].dependency.coordinates.configuration, "test");
    }

    #[test]
    fn test_parse_dependencies_rejects_bad_version() {
        let text = r#"[{"organization": "a", "artifact": "b", "version": "latest"}]"#;
        assert!(matches!(
            parse_dependencies("deps.json", text),
            Err(ConfigError::InvalidDependency { .. })
        ));
        assert!(parse_dependencies("deps.json", "{}").is_err());
    }

    #[tokio::test]
    async fn test_run_builds_report() {
        let orchestrator = Orchestrator::with_source(EngineConfig::default(), source()).unwrap();
        let report = orchestrator
            .run(vec![
                grouped("core", "org.slf4j", "slf4j-api", "2.0.9"),
                grouped("core", "org.slf4j", "slf4j-api", "=2.0.9"),
                grouped("web", "io.circe", "circe-core", "$circe"),
            ])
            .await
            .unwrap();

        let summary = report.summary();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.up_to_date, 1);
        assert_eq!(summary.deferred, 1);
        assert!(!report.has_pending_migrations());

        let snapshot = report.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["core"].len(), 2);
    }

    #[tokio::test]
    async fn test_run_loads_policies_per_run() {
        let dir = TempDir::new().unwrap();
        let migrations = dir.path().join("migrations.json");
        fs::write(
            &migrations,
            r#"{"migrations": [{"groupIdBefore": "com.geirsson", "groupIdAfter": "org.scalameta", "artifactIdAfter": "scalafmt"}]}"#,
        )
        .unwrap();
        let mut config = EngineConfig::default();
        config
            .policies
            .migrations
            .push(migrations.to_string_lossy().into_owned());

        let orchestrator = Orchestrator::with_source(config, source()).unwrap();
        let report = orchestrator
            .run(vec![grouped("core", "com.geirsson", "scalafmt", "1.5.1")])
            .await
            .unwrap();
        assert!(report.has_pending_migrations());
        assert_eq!(report.summary().pending_migrations, 1);
    }

    #[tokio::test]
    async fn test_run_fails_on_unresolvable_dependency() {
        let orchestrator = Orchestrator::with_source(EngineConfig::default(), source()).unwrap();
        let err = orchestrator
            .run(vec![grouped("core", "com.example", "unknown", "1.0.0")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Resolution(ResolutionError::NoValidVersion { .. })
        ));
    }

    #[tokio::test]
    async fn test_run_fails_on_missing_policy() {
        let mut config = EngineConfig::default();
        config.policies.pins.push("/nonexistent/pins.json".to_string());
        let orchestrator = Orchestrator::with_source(config, source()).unwrap();
        let err = orchestrator.run(Vec::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Config(ConfigError::PolicyFetch { .. })));
    }
}
