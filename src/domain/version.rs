//! Version model
//!
//! Handles declared versions like:
//! - `2.13.12`, `1.0.0-RC2`, `3.2.0.Final`
//! - `=1.2.3` (exact), `^1.2.3` (same major), `~1.2.3` (same minor)
//! - `$catsVersion` (variable, resolved elsewhere)

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

static NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([=^~])?(\d+(?:\.\d+)*)(.*)$").unwrap());

static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

static VARIABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\{?([A-Za-z_][A-Za-z0-9_.-]*)\}?$").unwrap());

/// Pin strength attached to a declared version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    /// Any newer version of the same shape may be picked
    #[default]
    NoMarker,
    /// Never updated
    Exact,
    /// Stays within the same major version
    Major,
    /// Stays within the same major.minor version
    Minor,
}

impl Marker {
    /// Parse the marker character that may prefix a version
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '=' => Some(Marker::Exact),
            '^' => Some(Marker::Major),
            '~' => Some(Marker::Minor),
            _ => None,
        }
    }

    /// The character written in front of the version, if any
    pub fn as_char(self) -> Option<char> {
        match self {
            Marker::NoMarker => None,
            Marker::Exact => Some('='),
            Marker::Major => Some('^'),
            Marker::Minor => Some('~'),
        }
    }
}

/// Returns true if `marker` allows moving from `reference` parts to `candidate` parts
pub fn marker_accepts(marker: Marker, reference: &[u64], candidate: &[u64]) -> bool {
    match marker {
        Marker::NoMarker => true,
        Marker::Exact => false,
        Marker::Major => reference.first() == candidate.first(),
        Marker::Minor => {
            reference.first() == candidate.first() && reference.get(1) == candidate.get(1)
        }
    }
}

/// A parsed numeric version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "NumericVersionRepr")]
pub struct NumericVersion {
    parts: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    suffix: Option<String>,
    #[serde(default)]
    marker: Marker,
}

#[derive(Deserialize)]
struct NumericVersionRepr {
    parts: Vec<u64>,
    #[serde(default)]
    suffix: Option<String>,
    #[serde(default)]
    marker: Marker,
}

impl TryFrom<NumericVersionRepr> for NumericVersion {
    type Error = String;

    fn try_from(repr: NumericVersionRepr) -> Result<Self, Self::Error> {
        NumericVersion::new(repr.parts, repr.suffix, repr.marker)
            .ok_or_else(|| "version parts must not be empty".to_string())
    }
}

impl NumericVersion {
    /// Creates a version from its parts. Returns None when `parts` is empty.
    pub fn new(parts: Vec<u64>, suffix: Option<String>, marker: Marker) -> Option<Self> {
        if parts.is_empty() {
            return None;
        }
        let suffix = suffix.filter(|s| !s.is_empty());
        Some(Self {
            parts,
            suffix,
            marker,
        })
    }

    /// Parse `[=^~]<digits>(.<digits>)*<suffix>`; None if there is no leading digit run
    pub fn parse(input: &str) -> Option<Self> {
        let caps = NUMERIC_RE.captures(input.trim())?;
        let marker = caps
            .get(1)
            .and_then(|m| m.as_str().chars().next())
            .and_then(Marker::from_char)
            .unwrap_or_default();
        let parts = caps
            .get(2)?
            .as_str()
            .split('.')
            .map(|p| p.parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;
        let suffix = caps.get(3).map(|m| m.as_str().to_string());
        Self::new(parts, suffix, marker)
    }

    pub fn parts(&self) -> &[u64] {
        &self.parts
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    pub fn marker(&self) -> Marker {
        self.marker
    }

    /// Same version carrying a different marker
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = marker;
        self
    }

    /// The version text without its marker character, as published by the index
    pub fn plain(&self) -> String {
        let mut out = self
            .parts
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        if let Some(ref suffix) = self.suffix {
            out.push_str(suffix);
        }
        out
    }

    /// First run of digits found anywhere in the suffix (0 when absent)
    pub fn suffix_number(&self) -> u64 {
        self.suffix
            .as_deref()
            .and_then(|s| DIGITS_RE.find(s))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    }

    /// Normalized suffix: lower-cased, leading separator stripped, digit runs erased
    pub fn suffix_type(&self) -> String {
        let Some(suffix) = self.suffix.as_deref() else {
            return String::new();
        };
        let lowered = suffix.to_lowercase();
        let trimmed = lowered
            .strip_prefix(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(&lowered);
        DIGITS_RE.replace_all(trimmed, "*").into_owned()
    }

    /// Total ordering: zero-padded parts first, then the suffix number.
    /// The marker does not take part in the comparison.
    pub fn compare(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                other => return other,
            }
        }
        self.suffix_number().cmp(&other.suffix_number())
    }

    /// Whether `candidate` is an acceptable upgrade target for this version
    pub fn is_valid_candidate(&self, candidate: &NumericVersion) -> bool {
        self.parts.len() == candidate.parts.len()
            && self.suffix_type() == candidate.suffix_type()
            && marker_accepts(self.marker, &self.parts, &candidate.parts)
    }
}

impl fmt::Display for NumericVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(c) = self.marker.as_char() {
            write!(f, "{}", c)?;
        }
        write!(f, "{}", self.plain())
    }
}

/// A declared version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Version {
    /// A concrete numeric version
    Numeric(NumericVersion),
    /// A reference to an externally defined value (e.g. `$catsVersion`)
    Variable { name: String },
}

impl Version {
    /// Parse a declared version: `$name` / `${name}` is a variable, anything else numeric
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Some(caps) = VARIABLE_RE.captures(input) {
            return Some(Version::Variable {
                name: caps[1].to_string(),
            });
        }
        NumericVersion::parse(input).map(Version::Numeric)
    }

    /// The numeric version, if this is not a variable
    pub fn as_numeric(&self) -> Option<&NumericVersion> {
        match self {
            Version::Numeric(v) => Some(v),
            Version::Variable { .. } => None,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Numeric(v) => write!(f, "{}", v),
            Version::Variable { name } => write!(f, "${}", name),
        }
    }
}
