//! Version patterns used by ignore lists, retractions and pins

use serde::{Deserialize, Serialize};

/// Match rule over a version string.
///
/// Any present sub-pattern matching is enough. A pattern with no sub-pattern
/// set matches nothing. In policy documents a bare string is shorthand for
/// `{ prefix = "..." }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawVersionPattern")]
pub struct VersionPattern {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawVersionPattern {
    Prefix(String),
    Full {
        #[serde(default)]
        prefix: Option<String>,
        #[serde(default)]
        suffix: Option<String>,
        #[serde(default)]
        exact: Option<String>,
        #[serde(default)]
        contains: Option<String>,
    },
}

impl From<RawVersionPattern> for VersionPattern {
    fn from(raw: RawVersionPattern) -> Self {
        match raw {
            RawVersionPattern::Prefix(prefix) => VersionPattern::prefix(prefix),
            RawVersionPattern::Full {
                prefix,
                suffix,
                exact,
                contains,
            } => VersionPattern {
                prefix,
                suffix,
                exact,
                contains,
            },
        }
    }
}

impl VersionPattern {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            ..Self::default()
        }
    }

    pub fn suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: Some(suffix.into()),
            ..Self::default()
        }
    }

    pub fn exact(exact: impl Into<String>) -> Self {
        Self {
            exact: Some(exact.into()),
            ..Self::default()
        }
    }

    pub fn contains(contains: impl Into<String>) -> Self {
        Self {
            contains: Some(contains.into()),
            ..Self::default()
        }
    }

    /// Returns true if any present sub-pattern matches `version`
    pub fn matches(&self, version: &str) -> bool {
        self.prefix.as_deref().is_some_and(|p| version.starts_with(p))
            || self.suffix.as_deref().is_some_and(|s| version.ends_with(s))
            || self.exact.as_deref().is_some_and(|e| version == e)
            || self.contains.as_deref().is_some_and(|c| version.contains(c))
    }
}
