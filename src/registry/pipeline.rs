//! Resolution pipeline: decorators around a VersionSource
//!
//! Layers, innermost first:
//! - TimeoutSource: bounds every underlying lookup
//! - CachedSource: one lookup per (coordinates, plugin) per run
//! - IgnoreFilter: drops ignored versions
//! - RetractionFilter: drops retracted versions
//! - PinFilter: keeps only pinned versions for pinned artifacts
//!
//! Every layer owns the layer below it and preserves the order of the versions
//! it passes through.

use crate::domain::{
    ArtifactFilter, Coordinates, IgnoredVersion, NumericVersion, RetractedArtifact, UpdatePin,
};
use crate::error::RegistryError;
use crate::registry::VersionSource;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Bounds each lookup of the wrapped source by a timeout
pub struct TimeoutSource {
    inner: Arc<dyn VersionSource>,
    timeout: Duration,
}

impl TimeoutSource {
    pub fn new(inner: Arc<dyn VersionSource>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl VersionSource for TimeoutSource {
    async fn find(
        &self,
        coordinates: &Coordinates,
        plugin: bool,
    ) -> Result<Vec<NumericVersion>, RegistryError> {
        tokio::time::timeout(self.timeout, self.inner.find(coordinates, plugin))
            .await
            .map_err(|_| RegistryError::timeout(coordinates.to_string(), "version source"))?
    }
}

type CacheKey = (Coordinates, bool);

/// Memoizes lookups for the lifetime of one resolution run.
///
/// Concurrent callers asking for the same key share one in-flight lookup.
/// A failed lookup is not cached.
pub struct CachedSource {
    inner: Arc<dyn VersionSource>,
    entries: DashMap<CacheKey, Arc<OnceCell<Vec<NumericVersion>>>>,
}

impl CachedSource {
    pub fn new(inner: Arc<dyn VersionSource>) -> Self {
        Self {
            inner,
            entries: DashMap::new(),
        }
    }

    /// Number of distinct keys looked up so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl VersionSource for CachedSource {
    async fn find(
        &self,
        coordinates: &Coordinates,
        plugin: bool,
    ) -> Result<Vec<NumericVersion>, RegistryError> {
        // Clone the cell out so the map shard is not locked across the await.
        let cell = Arc::clone(
            &self
                .entries
                .entry((coordinates.clone(), plugin))
                .or_default(),
        );
        let versions = cell
            .get_or_try_init(|| self.inner.find(coordinates, plugin))
            .await?;
        Ok(versions.clone())
    }
}

/// Drops versions matching an ignore entry
pub struct IgnoreFilter {
    inner: Arc<dyn VersionSource>,
    ignores: Arc<[IgnoredVersion]>,
}

impl IgnoreFilter {
    pub fn new(inner: Arc<dyn VersionSource>, ignores: Arc<[IgnoredVersion]>) -> Self {
        Self { inner, ignores }
    }
}

#[async_trait]
impl VersionSource for IgnoreFilter {
    async fn find(
        &self,
        coordinates: &Coordinates,
        plugin: bool,
    ) -> Result<Vec<NumericVersion>, RegistryError> {
        let mut versions = self.inner.find(coordinates, plugin).await?;
        versions.retain(|v| !self.ignores.iter().any(|i| i.matches(coordinates, v)));
        Ok(versions)
    }
}

/// Drops retracted versions; retractions stay queryable for warnings
pub struct RetractionFilter {
    inner: Arc<dyn VersionSource>,
    retractions: Arc<[RetractedArtifact]>,
}

impl RetractionFilter {
    pub fn new(inner: Arc<dyn VersionSource>, retractions: Arc<[RetractedArtifact]>) -> Self {
        Self { inner, retractions }
    }

    /// The retraction covering this version, if any
    pub fn retraction_for(
        &self,
        coordinates: &Coordinates,
        version: &NumericVersion,
    ) -> Option<&RetractedArtifact> {
        retraction_for(&self.retractions, coordinates, version)
    }
}

fn retraction_for<'a>(
    retractions: &'a [RetractedArtifact],
    coordinates: &Coordinates,
    version: &NumericVersion,
) -> Option<&'a RetractedArtifact> {
    retractions.iter().find(|r| r.matches(coordinates, version))
}

#[async_trait]
impl VersionSource for RetractionFilter {
    async fn find(
        &self,
        coordinates: &Coordinates,
        plugin: bool,
    ) -> Result<Vec<NumericVersion>, RegistryError> {
        let mut versions = self.inner.find(coordinates, plugin).await?;
        versions.retain(|v| self.retraction_for(coordinates, v).is_none());
        Ok(versions)
    }
}

/// Keeps only versions allowed by the pins of pinned artifacts.
///
/// Artifacts without any matching pin pass through unfiltered.
pub struct PinFilter {
    inner: Arc<dyn VersionSource>,
    pins: Arc<[UpdatePin]>,
}

impl PinFilter {
    pub fn new(inner: Arc<dyn VersionSource>, pins: Arc<[UpdatePin]>) -> Self {
        Self { inner, pins }
    }
}

#[async_trait]
impl VersionSource for PinFilter {
    async fn find(
        &self,
        coordinates: &Coordinates,
        plugin: bool,
    ) -> Result<Vec<NumericVersion>, RegistryError> {
        let mut versions = self.inner.find(coordinates, plugin).await?;
        let pins: Vec<&UpdatePin> = self
            .pins
            .iter()
            .filter(|p| p.applies_to(coordinates))
            .collect();
        if !pins.is_empty() {
            versions.retain(|v| pins.iter().any(|p| p.matches(coordinates, v)));
        }
        Ok(versions)
    }
}

/// The composed pipeline used by the resolver
pub struct Pipeline {
    source: Arc<dyn VersionSource>,
    retractions: Arc<[RetractedArtifact]>,
}

impl Pipeline {
    /// Start composing a pipeline over a raw source
    pub fn builder(raw: Arc<dyn VersionSource>) -> PipelineBuilder {
        PipelineBuilder::new(raw)
    }

    /// The retraction covering a version, used to warn about current versions
    pub fn retraction_for(
        &self,
        coordinates: &Coordinates,
        version: &NumericVersion,
    ) -> Option<&RetractedArtifact> {
        retraction_for(&self.retractions, coordinates, version)
    }
}

#[async_trait]
impl VersionSource for Pipeline {
    async fn find(
        &self,
        coordinates: &Coordinates,
        plugin: bool,
    ) -> Result<Vec<NumericVersion>, RegistryError> {
        self.source.find(coordinates, plugin).await
    }
}

/// Builds a Pipeline in the fixed layer order
pub struct PipelineBuilder {
    raw: Arc<dyn VersionSource>,
    timeout: Option<Duration>,
    ignores: Vec<IgnoredVersion>,
    retractions: Vec<RetractedArtifact>,
    pins: Vec<UpdatePin>,
}

impl PipelineBuilder {
    pub fn new(raw: Arc<dyn VersionSource>) -> Self {
        Self {
            raw,
            timeout: None,
            ignores: Vec::new(),
            retractions: Vec::new(),
            pins: Vec::new(),
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn ignores(mut self, ignores: Vec<IgnoredVersion>) -> Self {
        self.ignores = ignores;
        self
    }

    pub fn retractions(mut self, retractions: Vec<RetractedArtifact>) -> Self {
        self.retractions = retractions;
        self
    }

    pub fn pins(mut self, pins: Vec<UpdatePin>) -> Self {
        self.pins = pins;
        self
    }

    /// timeout → cache → ignore → retraction → pin
    pub fn build(self) -> Pipeline {
        let mut source = self.raw;
        if let Some(timeout) = self.timeout {
            source = Arc::new(TimeoutSource::new(source, timeout));
        }
        source = Arc::new(CachedSource::new(source));
        source = Arc::new(IgnoreFilter::new(source, self.ignores.into()));

        let retractions: Arc<[RetractedArtifact]> = self.retractions.into();
        source = Arc::new(RetractionFilter::new(source, Arc::clone(&retractions)));
        source = Arc::new(PinFilter::new(source, self.pins.into()));

        Pipeline {
            source,
            retractions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VersionPattern;
    use crate::registry::testing::FakeSource;

    fn coords() -> Coordinates {
        Coordinates::new("org.typelevel", "cats-core").cross(true)
    }

    fn plain(versions: &[NumericVersion]) -> Vec<String> {
        versions.iter().map(|v| v.plain()).collect()
    }

    fn fake() -> Arc<FakeSource> {
        Arc::new(FakeSource::new().with(coords(), &["2.8.0", "2.9.0", "2.10.0", "3.0.0-M1"]))
    }

    #[tokio::test]
    async fn test_cache_calls_source_once() {
        let fake = fake();
        let cached = CachedSource::new(fake.clone());
        for _ in 0..3 {
            cached.find(&coords(), false).await.unwrap();
        }
        assert_eq!(fake.calls(), 1);
        assert_eq!(cached.len(), 1);
    }

    #[tokio::test]
    async fn test_cache_keys_on_plugin_flag() {
        let fake = fake();
        let cached = CachedSource::new(fake.clone());
        cached.find(&coords(), false).await.unwrap();
        cached.find(&coords(), true).await.unwrap();
        assert_eq!(fake.calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_deduplicates_concurrent_lookups() {
        let fake = Arc::new(
            FakeSource::new()
                .with(coords(), &["1.0.0"])
                .with_delay(Duration::from_millis(20)),
        );
        let cached = Arc::new(CachedSource::new(fake.clone()));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cached = Arc::clone(&cached);
            handles.push(tokio::spawn(async move {
                cached.find(&coords(), false).await.unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().len(), 1);
        }
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_does_not_keep_failures() {
        let fake = Arc::new(FakeSource::new().failing());
        let cached = CachedSource::new(fake.clone());
        assert!(cached.find(&coords(), false).await.is_err());
        assert!(cached.find(&coords(), false).await.is_err());
        assert_eq!(fake.calls(), 2);
    }

    #[tokio::test]
    async fn test_timeout_is_an_error() {
        let fake = Arc::new(
            FakeSource::new()
                .with(coords(), &["1.0.0"])
                .with_delay(Duration::from_millis(200)),
        );
        let source = TimeoutSource::new(fake, Duration::from_millis(10));
        let err = source.find(&coords(), false).await.unwrap_err();
        assert!(matches!(err, RegistryError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_ignore_filter_preserves_order() {
        let ignores: Arc<[IgnoredVersion]> = vec![IgnoredVersion::new("org.typelevel", None)
            .with_version(VersionPattern::exact("2.9.0"))]
        .into();
        let filter = IgnoreFilter::new(fake(), ignores);
        let versions = filter.find(&coords(), false).await.unwrap();
        assert_eq!(plain(&versions), vec!["2.8.0", "2.10.0", "3.0.0-M1"]);
    }

    #[tokio::test]
    async fn test_ignore_filter_other_coordinates_untouched() {
        let ignores: Arc<[IgnoredVersion]> = vec![IgnoredVersion::new("io.circe", None)].into();
        let filter = IgnoreFilter::new(fake(), ignores);
        assert_eq!(filter.find(&coords(), false).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_retraction_filter() {
        let retractions: Arc<[RetractedArtifact]> =
            vec![RetractedArtifact::new("org.typelevel", Some("cats-core"))
                .with_version(VersionPattern::prefix("2.10"))
                .with_reason("binary incompatible")]
            .into();
        let filter = RetractionFilter::new(fake(), retractions);
        let versions = filter.find(&coords(), false).await.unwrap();
        assert_eq!(plain(&versions), vec!["2.8.0", "2.9.0", "3.0.0-M1"]);

        let retracted = NumericVersion::parse("2.10.0").unwrap();
        let entry = filter.retraction_for(&coords(), &retracted).unwrap();
        assert_eq!(entry.reason.as_deref(), Some("binary incompatible"));
    }

    #[tokio::test]
    async fn test_pin_filter_keeps_pinned_versions() {
        let pins: Arc<[UpdatePin]> = vec![UpdatePin::new("org.typelevel", Some("cats-core"))
            .with_version(VersionPattern::prefix("2."))]
        .into();
        let filter = PinFilter::new(fake(), pins);
        let versions = filter.find(&coords(), false).await.unwrap();
        assert_eq!(plain(&versions), vec!["2.8.0", "2.9.0", "2.10.0"]);
    }

    #[tokio::test]
    async fn test_pin_filter_without_matching_pin_passes_all() {
        let pins: Arc<[UpdatePin]> =
            vec![UpdatePin::new("io.circe", None).with_version(VersionPattern::prefix("0.14."))]
                .into();
        let filter = PinFilter::new(fake(), pins);
        assert_eq!(filter.find(&coords(), false).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_pin_filter_multiple_pins_are_or_combined() {
        let pins: Arc<[UpdatePin]> = vec![
            UpdatePin::new("org.typelevel", None).with_version(VersionPattern::exact("2.8.0")),
            UpdatePin::new("org.typelevel", None).with_version(VersionPattern::exact("3.0.0-M1")),
        ]
        .into();
        let filter = PinFilter::new(fake(), pins);
        let versions = filter.find(&coords(), false).await.unwrap();
        assert_eq!(plain(&versions), vec!["2.8.0", "3.0.0-M1"]);
    }

    #[tokio::test]
    async fn test_ignore_and_pin_commute() {
        let ignores: Arc<[IgnoredVersion]> = vec![IgnoredVersion::new("org.typelevel", None)
            .with_version(VersionPattern::exact("3.0.0-M1"))]
        .into();
        let pins: Arc<[UpdatePin]> = vec![UpdatePin::new("org.typelevel", None)
            .with_version(VersionPattern::prefix("2."))]
        .into();

        let ignore_then_pin = PinFilter::new(
            Arc::new(IgnoreFilter::new(fake(), Arc::clone(&ignores))),
            Arc::clone(&pins),
        );
        let pin_then_ignore = IgnoreFilter::new(Arc::new(PinFilter::new(fake(), pins)), ignores);

        assert_eq!(
            ignore_then_pin.find(&coords(), false).await.unwrap(),
            pin_then_ignore.find(&coords(), false).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_layers_do_not_mutate_source() {
        let fake = fake();
        let ignores: Arc<[IgnoredVersion]> = vec![IgnoredVersion::new("org.typelevel", None)].into();
        let filter = IgnoreFilter::new(fake.clone(), ignores);
        assert!(filter.find(&coords(), false).await.unwrap().is_empty());
        assert_eq!(fake.find(&coords(), false).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_pipeline_applies_all_layers() {
        let fake = fake();
        let pipeline = Pipeline::builder(fake.clone())
            .timeout(Duration::from_secs(5))
            .ignores(vec![IgnoredVersion::new("org.typelevel", None)
                .with_version(VersionPattern::exact("2.8.0"))])
            .retractions(vec![RetractedArtifact::new("org.typelevel", None)
                .with_version(VersionPattern::exact("2.10.0"))])
            .pins(vec![UpdatePin::new("org.typelevel", None)
                .with_version(VersionPattern::prefix("2."))])
            .build();

        let versions = pipeline.find(&coords(), false).await.unwrap();
        assert_eq!(plain(&versions), vec!["2.9.0"]);

        pipeline.find(&coords(), false).await.unwrap();
        assert_eq!(fake.calls(), 1);

        let current = NumericVersion::parse("~2.10.0").unwrap();
        assert!(pipeline.retraction_for(&coords(), &current).is_some());
    }

    #[tokio::test]
    async fn test_pipeline_tolerates_empty_results() {
        let pipeline = Pipeline::builder(Arc::new(FakeSource::new())).build();
        let versions = pipeline
            .find(&Coordinates::new("com.example", "nothing"), false)
            .await
            .unwrap();
        assert!(versions.is_empty());
    }
}
