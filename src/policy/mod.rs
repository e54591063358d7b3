//! Remote policy loading
//!
//! This module provides:
//! - PolicyCache: per-run cache of decoded documents, keyed by location
//! - PolicyLoader: fetches documents over HTTP or from the filesystem
//! - Document decoding with per-entry error tolerance

mod document;

pub use document::{parse_document, DocumentFormat, ParsedDocument, PolicyEntry};

use crate::domain::{ArtifactMigration, IgnoredVersion, RetractedArtifact, UpdatePin};
use crate::error::ConfigError;
use crate::registry::HttpClient;
use dashmap::DashMap;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Decoded entries of one kind, keyed by document location
pub struct DocumentCache<T> {
    documents: DashMap<String, Arc<OnceCell<Arc<[T]>>>>,
}

impl<T> Default for DocumentCache<T> {
    fn default() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }
}

impl<T> DocumentCache<T> {
    fn cell(&self, url: &str) -> Arc<OnceCell<Arc<[T]>>> {
        Arc::clone(&self.documents.entry(url.to_string()).or_default())
    }

    /// Number of documents loaded (or being loaded)
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Everything fetched during one run; each location is fetched at most once
#[derive(Default)]
pub struct PolicyCache {
    migrations: DocumentCache<ArtifactMigration>,
    retractions: DocumentCache<RetractedArtifact>,
    pins: DocumentCache<UpdatePin>,
    ignores: DocumentCache<IgnoredVersion>,
}

impl PolicyCache {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Selects the cache slot of an entry kind
pub trait Cached: PolicyEntry {
    fn slot(cache: &PolicyCache) -> &DocumentCache<Self>;
}

impl Cached for ArtifactMigration {
    fn slot(cache: &PolicyCache) -> &DocumentCache<Self> {
        &cache.migrations
    }
}

impl Cached for RetractedArtifact {
    fn slot(cache: &PolicyCache) -> &DocumentCache<Self> {
        &cache.retractions
    }
}

impl Cached for UpdatePin {
    fn slot(cache: &PolicyCache) -> &DocumentCache<Self> {
        &cache.pins
    }
}

impl Cached for IgnoredVersion {
    fn slot(cache: &PolicyCache) -> &DocumentCache<Self> {
        &cache.ignores
    }
}

/// The full set of policies in force for a run
#[derive(Debug, Clone, Default)]
pub struct Policies {
    pub migrations: Vec<ArtifactMigration>,
    pub retractions: Vec<RetractedArtifact>,
    pub pins: Vec<UpdatePin>,
    pub ignores: Vec<IgnoredVersion>,
}

/// Document locations, one list per policy kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicySources {
    pub migrations: Vec<String>,
    pub retractions: Vec<String>,
    pub pins: Vec<String>,
    pub ignores: Vec<String>,
}

/// Fetches and decodes policy documents
#[derive(Clone)]
pub struct PolicyLoader {
    client: HttpClient,
}

impl PolicyLoader {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Entries of kind `T` from every location, in location order
    pub async fn load<T: Cached>(
        &self,
        cache: &PolicyCache,
        urls: &[String],
    ) -> Result<Vec<T>, ConfigError> {
        let slot = T::slot(cache);
        let mut entries = Vec::new();
        for url in urls {
            let cell = slot.cell(url);
            let document = cell
                .get_or_try_init(|| async {
                    let text = self.fetch(url).await?;
                    let parsed =
                        parse_document::<T>(url, &text, DocumentFormat::from_location(url))?;
                    Ok::<_, ConfigError>(Arc::from(parsed.entries))
                })
                .await?;
            entries.extend(document.iter().cloned());
        }
        Ok(entries)
    }

    pub async fn load_migrations(
        &self,
        cache: &PolicyCache,
        urls: &[String],
    ) -> Result<Vec<ArtifactMigration>, ConfigError> {
        self.load(cache, urls).await
    }

    pub async fn load_retractions(
        &self,
        cache: &PolicyCache,
        urls: &[String],
    ) -> Result<Vec<RetractedArtifact>, ConfigError> {
        self.load(cache, urls).await
    }

    pub async fn load_pins(
        &self,
        cache: &PolicyCache,
        urls: &[String],
    ) -> Result<Vec<UpdatePin>, ConfigError> {
        self.load(cache, urls).await
    }

    pub async fn load_ignores(
        &self,
        cache: &PolicyCache,
        urls: &[String],
    ) -> Result<Vec<IgnoredVersion>, ConfigError> {
        self.load(cache, urls).await
    }

    /// Loads every kind of policy named in `sources`
    pub async fn load_all(
        &self,
        cache: &PolicyCache,
        sources: &PolicySources,
    ) -> Result<Policies, ConfigError> {
        let (migrations, retractions, pins, ignores) = tokio::try_join!(
            self.load_migrations(cache, &sources.migrations),
            self.load_retractions(cache, &sources.retractions),
            self.load_pins(cache, &sources.pins),
            self.load_ignores(cache, &sources.ignores),
        )?;
        Ok(Policies {
            migrations,
            retractions,
            pins,
            ignores,
        })
    }

    /// Raw document text from `http(s)://`, `file://` or a plain path
    async fn fetch(&self, url: &str) -> Result<String, ConfigError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return self
                .client
                .get_text(url, url, "policy host")
                .await
                .map_err(|e| ConfigError::policy_fetch(url, e.to_string()));
        }

        let path = Path::new(url.strip_prefix("file://").unwrap_or(url));
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::policy_fetch(url, e.to_string()))
    }
}
