//! Dependency information structures

use super::{Coordinates, Version, DEFAULT_CONFIGURATION};
use crate::error::ConfigError;
use crate::snapshot::ResolvedDep;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Group used when a dependency record does not name one
pub const DEFAULT_GROUP: &str = "default";

/// A declared dependency: coordinates plus version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    /// Identity of the artifact
    pub coordinates: Coordinates,
    /// Declared version
    pub version: Version,
    /// Whether the artifact is a build-tool plugin (affects index queries)
    #[serde(default)]
    pub is_plugin: bool,
}

impl Dependency {
    /// Creates a new (non-plugin) dependency
    pub fn new(coordinates: Coordinates, version: Version) -> Self {
        Self {
            coordinates,
            version,
            is_plugin: false,
        }
    }

    /// Creates a new plugin dependency
    pub fn plugin(coordinates: Coordinates, version: Version) -> Self {
        Self {
            coordinates,
            version,
            is_plugin: true,
        }
    }

    /// Returns a new dependency with another version
    pub fn with_version(&self, version: Version) -> Self {
        Self {
            coordinates: self.coordinates.clone(),
            version,
            is_plugin: self.is_plugin,
        }
    }

    /// Returns a new dependency with other coordinates and version
    pub fn moved(&self, coordinates: Coordinates, version: Version) -> Self {
        Self {
            coordinates,
            version,
            is_plugin: self.is_plugin,
        }
    }

    /// Flattened snapshot entry; None for variable versions
    pub fn to_resolved(&self) -> Option<ResolvedDep> {
        self.version.as_numeric().map(|v| {
            ResolvedDep::new(
                &self.coordinates.organization,
                &self.coordinates.artifact,
                v.plain(),
            )
        })
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plugin_marker = if self.is_plugin { " (plugin)" } else { "" };
        write!(f, "{}@{}{}", self.coordinates, self.version, plugin_marker)
    }
}

/// Dependency record as handed to the engine by the surrounding tooling
#[derive(Debug, Clone, Deserialize)]
pub struct DependencyRecord {
    pub organization: String,
    pub artifact: String,
    pub version: String,
    #[serde(default)]
    pub cross: bool,
    #[serde(default)]
    pub configuration: Option<String>,
    #[serde(default)]
    pub plugin: bool,
    /// Logical group (project/module) the dependency belongs to
    #[serde(default)]
    pub group: Option<String>,
}

impl DependencyRecord {
    /// Converts the record into its group name and dependency
    pub fn into_dependency(self) -> Result<(String, Dependency), ConfigError> {
        let coordinates = Coordinates::new(self.organization, self.artifact)
            .cross(self.cross)
            .with_configuration(
                self.configuration
                    .unwrap_or_else(|| DEFAULT_CONFIGURATION.to_string()),
            );
        let version =
            Version::parse(&self.version).ok_or_else(|| ConfigError::InvalidDependency {
                coordinates: coordinates.to_string(),
                message: format!("unparsable version '{}'", self.version),
            })?;
        let group = self.group.unwrap_or_else(|| DEFAULT_GROUP.to_string());
        let dependency = Dependency {
            coordinates,
            version,
            is_plugin: self.plugin,
        };
        Ok((group, dependency))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NumericVersion;

    fn cats(version: &str) -> Dependency {
        Dependency::new(
            Coordinates::new("org.typelevel", "cats-core").cross(true),
            Version::parse(version).unwrap(),
        )
    }

    #[test]
    fn test_with_version_produces_new_value() {
        let dep = cats("2.9.0");
        let updated = dep.with_version(Version::parse("2.10.0").unwrap());
        assert_eq!(dep.version.to_string(), "2.9.0");
        assert_eq!(updated.version.to_string(), "2.10.0");
        assert_eq!(updated.coordinates, dep.coordinates);
    }

    #[test]
    fn test_to_resolved_strips_marker() {
        let resolved = cats("~2.9.0").to_resolved().unwrap();
        assert_eq!(resolved.organization, "org.typelevel");
        assert_eq!(resolved.artifact, "cats-core");
        assert_eq!(resolved.version, "2.9.0");
    }

    #[test]
    fn test_to_resolved_variable_is_none() {
        assert!(cats("$catsVersion").to_resolved().is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(cats("^2.9.0").to_string(), "org.typelevel::cats-core@^2.9.0");
        let plugin = Dependency::plugin(
            Coordinates::new("org.scalameta", "sbt-scalafmt"),
            Version::Numeric(NumericVersion::parse("2.5.2").unwrap()),
        );
        assert_eq!(plugin.to_string(), "org.scalameta:sbt-scalafmt@2.5.2 (plugin)");
    }

    #[test]
    fn test_record_into_dependency() {
        let record: DependencyRecord = serde_json::from_str(
            r#"{"organization": "org.typelevel", "artifact": "cats-core", "version": "~2.9.0", "cross": true, "group": "core"}"#,
        )
        .unwrap();
        let (group, dep) = record.into_dependency().unwrap();
        assert_eq!(group, "core");
        assert!(dep.coordinates.is_cross);
        assert_eq!(dep.coordinates.configuration, "compile");
        assert_eq!(dep.version.to_string(), "~2.9.0");
    }

    #[test]
    fn test_record_defaults_group() {
        let record: DependencyRecord = serde_json::from_str(
            r#"{"organization": "a", "artifact": "b", "version": "1.0", "configuration": "test"}"#,
        )
        .unwrap();
        let (group, dep) = record.into_dependency().unwrap();
        assert_eq!(group, DEFAULT_GROUP);
        assert_eq!(dep.coordinates.configuration, "test");
    }

    #[test]
    fn test_record_rejects_bad_version() {
        let record: DependencyRecord =
            serde_json::from_str(r#"{"organization": "a", "artifact": "b", "version": "latest"}"#)
                .unwrap();
        let err = record.into_dependency().unwrap_err();
        assert!(err.to_string().contains("latest"));
    }

    #[test]
    fn test_serde_dependency() {
        let dep = cats("^2.9.0");
        let json = serde_json::to_string(&dep).unwrap();
        let parsed: Dependency = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, dep);
    }
}
