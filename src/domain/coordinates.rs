//! Artifact coordinates (identity of a dependency without its version)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration used when a declaration does not name one
pub const DEFAULT_CONFIGURATION: &str = "compile";

/// Identity of a dependency excluding its version
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinates {
    /// Organization / group id (e.g. `org.typelevel`)
    pub organization: String,
    /// Artifact name without any binary-version suffix (e.g. `cats-core`)
    pub artifact: String,
    /// Whether the artifact is cross-built for several language binary versions
    pub is_cross: bool,
    /// Build configuration the dependency belongs to (e.g. `compile`, `test`)
    pub configuration: String,
}

impl Coordinates {
    /// Creates plain (non cross-built) coordinates in the default configuration
    pub fn new(organization: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            artifact: artifact.into(),
            is_cross: false,
            configuration: DEFAULT_CONFIGURATION.to_string(),
        }
    }

    /// Marks the coordinates as cross-built
    pub fn cross(mut self, is_cross: bool) -> Self {
        self.is_cross = is_cross;
        self
    }

    /// Sets the configuration
    pub fn with_configuration(mut self, configuration: impl Into<String>) -> Self {
        self.configuration = configuration.into();
        self
    }

    /// Same coordinates with a different organization and artifact
    pub fn moved_to(&self, organization: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            organization: organization.into(),
            artifact: artifact.into(),
            is_cross: self.is_cross,
            configuration: self.configuration.clone(),
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.is_cross { "::" } else { ":" };
        write!(f, "{}{}{}", self.organization, sep, self.artifact)?;
        if self.configuration != DEFAULT_CONFIGURATION {
            write!(f, " ({})", self.configuration)?;
        }
        Ok(())
    }
}
