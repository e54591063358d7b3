//! Policy entries loaded from remote documents
//!
//! - IgnoredVersion: versions never offered as update targets
//! - RetractedArtifact: versions withdrawn by their publisher
//! - UpdatePin: per-artifact allow-lists of versions
//! - ArtifactMigration: coordinates that moved to a new group/artifact

use super::{Coordinates, NumericVersion, VersionPattern};
use serde::{Deserialize, Serialize};

/// Coordinate filter with optional version scoping.
///
/// `artifact_id` absent means every artifact of the group, `version` absent
/// means every version.
pub trait ArtifactFilter {
    fn group_id(&self) -> &str;
    fn artifact_id(&self) -> Option<&str>;
    fn version(&self) -> Option<&VersionPattern>;

    /// Whether the entry concerns these coordinates at all
    fn applies_to(&self, coordinates: &Coordinates) -> bool {
        self.group_id() == coordinates.organization
            && self
                .artifact_id()
                .is_none_or(|artifact| artifact == coordinates.artifact)
    }

    /// Whether the entry concerns these coordinates and this version
    fn matches(&self, coordinates: &Coordinates, version: &NumericVersion) -> bool {
        self.applies_to(coordinates)
            && self
                .version()
                .is_none_or(|pattern| pattern.matches(&version.plain()))
    }
}

macro_rules! impl_artifact_filter {
    ($ty:ty) => {
        impl ArtifactFilter for $ty {
            fn group_id(&self) -> &str {
                &self.group_id
            }

            fn artifact_id(&self) -> Option<&str> {
                self.artifact_id.as_deref()
            }

            fn version(&self) -> Option<&VersionPattern> {
                self.version.as_ref()
            }
        }
    };
}

/// Versions excluded from update candidates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IgnoredVersion {
    pub group_id: String,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub version: Option<VersionPattern>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Versions withdrawn by their publisher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetractedArtifact {
    pub group_id: String,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub version: Option<VersionPattern>,
    #[serde(default)]
    pub reason: Option<String>,
    /// Link to the announcement of the retraction
    #[serde(default)]
    pub doc: Option<String>,
}

/// Restricts the versions an artifact may be updated to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePin {
    pub group_id: String,
    #[serde(default)]
    pub artifact_id: Option<String>,
    #[serde(default)]
    pub version: Option<VersionPattern>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl_artifact_filter!(IgnoredVersion);
impl_artifact_filter!(RetractedArtifact);
impl_artifact_filter!(UpdatePin);

impl IgnoredVersion {
    pub fn new(group_id: impl Into<String>, artifact_id: Option<&str>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.map(str::to_string),
            version: None,
            reason: None,
        }
    }

    pub fn with_version(mut self, version: VersionPattern) -> Self {
        self.version = Some(version);
        self
    }
}

impl RetractedArtifact {
    pub fn new(group_id: impl Into<String>, artifact_id: Option<&str>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.map(str::to_string),
            version: None,
            reason: None,
            doc: None,
        }
    }

    pub fn with_version(mut self, version: VersionPattern) -> Self {
        self.version = Some(version);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl UpdatePin {
    pub fn new(group_id: impl Into<String>, artifact_id: Option<&str>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.map(str::to_string),
            version: None,
            reason: None,
        }
    }

    pub fn with_version(mut self, version: VersionPattern) -> Self {
        self.version = Some(version);
        self
    }
}

/// Coordinates that moved to a new group and/or artifact name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMigration {
    #[serde(default)]
    pub group_id_before: Option<String>,
    pub group_id_after: String,
    #[serde(default)]
    pub artifact_id_before: Option<String>,
    pub artifact_id_after: String,
}

impl ArtifactMigration {
    /// At least one of the "before" fields must be present
    pub fn is_complete(&self) -> bool {
        self.group_id_before.is_some() || self.artifact_id_before.is_some()
    }

    /// Group and artifact both match, each either by its "before" value or by
    /// falling back to its "after" value
    pub fn matches(&self, coordinates: &Coordinates) -> bool {
        let group_matches = self.group_id_before.as_deref() == Some(coordinates.organization.as_str())
            || self.group_id_after == coordinates.organization;
        let artifact_matches = self.artifact_id_before.as_deref() == Some(coordinates.artifact.as_str())
            || self.artifact_id_after == coordinates.artifact;
        group_matches && artifact_matches
    }

    /// Whether `coordinates` already sit on the migration target
    pub fn is_target(&self, coordinates: &Coordinates) -> bool {
        self.group_id_after == coordinates.organization
            && self.artifact_id_after == coordinates.artifact
    }

    /// The coordinates a matching dependency moves to
    pub fn target(&self, coordinates: &Coordinates) -> Coordinates {
        coordinates.moved_to(&self.group_id_after, &self.artifact_id_after)
    }
}
