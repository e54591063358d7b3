//! Maven Central Search API version source
//!
//! Fetches published versions from Maven Central.
//! API endpoint: https://search.maven.org/solrsearch/select
//!
//! Query format: q=g:{groupId}+AND+a:{artifactId}&core=gav&rows=200&wt=json
//!
//! Cross-built artifacts are published as `{artifact}_{binary version}`.
//! Plugins are queried under both the legacy `{artifact}_{plugin suffix}` name
//! and the bare artifact name, and the results are unioned.

use crate::domain::{Coordinates, NumericVersion};
use crate::error::RegistryError;
use crate::registry::{HttpClient, VersionSource};
use async_trait::async_trait;
use serde::Deserialize;

/// Maven Central Search API base URL
const MAVEN_CENTRAL_API_URL: &str = "https://search.maven.org/solrsearch/select";

/// Maximum number of versions to fetch per query
const MAX_VERSIONS: u32 = 200;

/// Registry name used in errors and logs
const REGISTRY_NAME: &str = "Maven Central";

/// Language binary versions used to build artifact names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryVersions {
    /// Suffix of cross-built artifacts (e.g. `2.13`, `3`)
    pub language: String,
    /// Suffix of legacy plugin artifacts (e.g. `2.12_1.0`)
    pub plugin: String,
}

impl Default for BinaryVersions {
    fn default() -> Self {
        Self {
            language: "2.13".to_string(),
            plugin: "2.12_1.0".to_string(),
        }
    }
}

/// Maven Central version source
pub struct MavenCentralSource {
    client: HttpClient,
    base_url: String,
    binary: BinaryVersions,
}

/// Maven Central search response
#[derive(Debug, Deserialize)]
struct MavenSearchResponse {
    response: MavenResponseBody,
}

/// Maven Central response body
#[derive(Debug, Deserialize)]
struct MavenResponseBody {
    docs: Vec<MavenVersionDoc>,
}

/// Maven Central version document
#[derive(Debug, Deserialize)]
struct MavenVersionDoc {
    /// Version string
    v: String,
}

impl MavenCentralSource {
    /// Create a new Maven Central source
    pub fn new(client: HttpClient, binary: BinaryVersions) -> Self {
        Self {
            client,
            base_url: MAVEN_CENTRAL_API_URL.to_string(),
            binary,
        }
    }

    /// Use a mirror exposing the same search API
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Artifact names to query, in query order
    fn artifact_names(&self, coordinates: &Coordinates, plugin: bool) -> Vec<String> {
        if plugin {
            vec![
                format!("{}_{}", coordinates.artifact, self.binary.plugin),
                coordinates.artifact.clone(),
            ]
        } else if coordinates.is_cross {
            vec![format!("{}_{}", coordinates.artifact, self.binary.language)]
        } else {
            vec![coordinates.artifact.clone()]
        }
    }

    /// Build search URL for group:artifact
    fn build_url(&self, group: &str, artifact: &str) -> String {
        format!(
            "{}?q=g:{}+AND+a:{}&core=gav&rows={}&wt=json",
            self.base_url, group, artifact, MAX_VERSIONS
        )
    }

    /// Versions published under one concrete artifact name
    async fn query(&self, group: &str, artifact: &str) -> Result<Vec<String>, RegistryError> {
        let package = format!("{}:{}", group, artifact);
        let url = self.build_url(group, artifact);
        let response: Option<MavenSearchResponse> =
            self.client.get_json(&url, &package, REGISTRY_NAME).await?;

        Ok(response
            .map(|r| r.response.docs.into_iter().map(|d| d.v).collect())
            .unwrap_or_default())
    }
}

/// Parse raw version strings, dropping unparsable and duplicate ones while
/// keeping the first-seen order
pub(crate) fn collect_versions<I>(raw: I) -> Vec<NumericVersion>
where
    I: IntoIterator<Item = String>,
{
    let mut versions: Vec<NumericVersion> = Vec::new();
    for text in raw {
        match NumericVersion::parse(&text) {
            Some(version) if !versions.contains(&version) => versions.push(version),
            Some(_) => {}
            None => tracing::debug!("ignoring non-numeric version '{}'", text),
        }
    }
    versions
}

#[async_trait]
impl VersionSource for MavenCentralSource {
    async fn find(
        &self,
        coordinates: &Coordinates,
        plugin: bool,
    ) -> Result<Vec<NumericVersion>, RegistryError> {
        let mut raw = Vec::new();
        for artifact in self.artifact_names(coordinates, plugin) {
            raw.extend(self.query(&coordinates.organization, &artifact).await?);
        }
        let versions = collect_versions(raw);
        tracing::debug!("{}: {} version(s) listed", coordinates, versions.len());
        Ok(versions)
    }
}
