//! Engine configuration
//!
//! Settings come from an optional TOML file and are overridden by CLI flags.
//!
//! ```toml
//! parallelism = 8
//! timeout = "30s"
//! scala_version = "2.13"
//!
//! [policies]
//! pins = ["https://example.org/pins.json"]
//! ```

use crate::cli::ResolveArgs;
use crate::error::ConfigError;
use crate::policy::PolicySources;
use crate::registry::{BinaryVersions, DEFAULT_TIMEOUT};
use crate::update::default_parallelism;
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::time::Duration;

/// Parse duration string in format: Nms (milliseconds), Ns (seconds), Nm (minutes)
pub fn parse_duration(s: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration {
        value: s.to_string(),
    };
    let s = s.trim();

    // "ms" must be checked before "m" and "s"
    let (num_str, unit) = if let Some(n) = s.strip_suffix("ms") {
        (n, "ms")
    } else if let Some(n) = s.strip_suffix('s') {
        (n, "s")
    } else if let Some(n) = s.strip_suffix('m') {
        (n, "m")
    } else {
        return Err(invalid());
    };

    let num: u64 = num_str.parse().map_err(|_| invalid())?;
    let duration = match unit {
        "ms" => Duration::from_millis(num),
        "s" => Duration::from_secs(num),
        _ => Duration::from_secs(num * 60),
    };
    if duration.is_zero() {
        return Err(invalid());
    }
    Ok(duration)
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_duration(&text).map_err(serde::de::Error::custom)
}

/// Settings of a resolution run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum number of dependencies resolved concurrently
    pub parallelism: usize,
    /// Timeout of each version lookup
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    /// Move dependencies to migrated coordinates
    pub apply_migrations: bool,
    /// Binary version suffix of cross-built artifacts
    pub scala_version: String,
    /// Binary version the legacy plugin artifacts are built for
    pub plugin_scala_version: String,
    /// Plugin API version of legacy plugin artifacts
    pub plugin_api: String,
    /// Search endpoint overriding Maven Central
    pub index_url: Option<String>,
    /// Policy document locations
    pub policies: PolicySources,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            timeout: DEFAULT_TIMEOUT,
            apply_migrations: false,
            scala_version: "2.13".to_string(),
            plugin_scala_version: "2.12".to_string(),
            plugin_api: "1.0".to_string(),
            index_url: None,
            policies: PolicySources::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML configuration
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::file("<inline>", e.to_string()))
    }

    /// Load a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::file(path, e.to_string()))?;
        toml::from_str(&text).map_err(|e| ConfigError::file(path, e.to_string()))
    }

    /// Configuration for `depgov resolve`: file defaults, then CLI overrides
    pub fn from_args(args: &ResolveArgs) -> Result<Self, ConfigError> {
        let base = match args.config {
            Some(ref path) => Self::from_file(path)?,
            None => Self::default(),
        };
        Ok(base.merge_args(args))
    }

    /// Apply CLI flags on top of this configuration.
    ///
    /// Policy locations given on the command line are added to those of the file.
    pub fn merge_args(mut self, args: &ResolveArgs) -> Self {
        if let Some(parallelism) = args.parallelism {
            self.parallelism = parallelism;
        }
        if let Some(timeout) = args.timeout {
            self.timeout = timeout;
        }
        if args.apply_migrations {
            self.apply_migrations = true;
        }
        if let Some(ref version) = args.scala_version {
            self.scala_version = version.clone();
        }
        if let Some(ref api) = args.plugin_api {
            self.plugin_api = api.clone();
        }
        if let Some(ref url) = args.index_url {
            self.index_url = Some(url.clone());
        }
        self.policies.migrations.extend(args.migrations.iter().cloned());
        self.policies.retractions.extend(args.retractions.iter().cloned());
        self.policies.pins.extend(args.pins.iter().cloned());
        self.policies.ignores.extend(args.ignores.iter().cloned());
        self.parallelism = self.parallelism.max(1);
        self
    }

    /// Artifact name suffixes used when querying the index
    pub fn binary_versions(&self) -> BinaryVersions {
        BinaryVersions {
            language: self.scala_version.clone(),
            plugin: format!("{}_{}", self.plugin_scala_version, self.plugin_api),
        }
    }
}
