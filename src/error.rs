//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ConfigError: malformed policy documents, invalid configuration values
//! - RegistryError: issues talking to the remote version index
//! - ResolutionError: a dependency could not be resolved (always fatal for the run)
//! - SnapshotError: snapshot file read/write failures

use std::path::PathBuf;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Version index related errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Resolution failures
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Snapshot file errors
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Errors related to configuration and policy documents
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A single entry of a policy document could not be decoded
    #[error("skipping malformed entry #{index} in {url}: {message}")]
    MalformedEntry {
        url: String,
        index: usize,
        message: String,
    },

    /// A migration entry names neither groupIdBefore nor artifactIdBefore
    #[error("skipping migration #{index} in {url}: groupIdBefore or artifactIdBefore is required")]
    IncompleteMigration { url: String, index: usize },

    /// A policy document could not be fetched
    #[error("failed to fetch policy document {url}: {message}")]
    PolicyFetch { url: String, message: String },

    /// A policy document is not valid JSON/TOML as a whole
    #[error("failed to parse policy document {url}: {message}")]
    PolicyParse { url: String, message: String },

    /// Invalid duration format
    #[error("invalid duration format '{value}': expected format like '30s', '2m', '500ms'")]
    InvalidDuration { value: String },

    /// Invalid dependency declaration handed to the engine
    #[error("invalid dependency {coordinates}: {message}")]
    InvalidDependency {
        coordinates: String,
        message: String,
    },

    /// Configuration or dependency file could not be read or parsed
    #[error("failed to load {path}: {message}")]
    File { path: PathBuf, message: String },
}

/// Errors related to version index communication
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Network request failed
    #[error("failed to fetch '{package}' from {registry}: {message}")]
    NetworkError {
        package: String,
        registry: String,
        message: String,
    },

    /// Invalid response from the index
    #[error("invalid response from {registry} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        registry: String,
        message: String,
    },

    /// Lookup exceeded the configured timeout
    #[error("timeout while fetching '{package}' from {registry}")]
    Timeout { package: String, registry: String },
}

/// Errors that make a resolution run fail
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// No published version passed the candidate filters
    #[error("no valid version found for {coordinates} (current {current})")]
    NoValidVersion {
        coordinates: String,
        current: String,
    },

    /// Version lookup failed (transport error or timeout)
    #[error(transparent)]
    Lookup(#[from] RegistryError),

    /// The run was cancelled before every dependency resolved
    #[error("resolution cancelled before completion")]
    Cancelled,

    /// A resolution task terminated abnormally
    #[error("resolution task failed: {message}")]
    Task { message: String },
}

/// Errors related to snapshot files
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// Failed to read snapshot file
    #[error("failed to read snapshot {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write snapshot file
    #[error("failed to write snapshot {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An entry cannot be written without changing on read-back
    #[error("cannot write snapshot {path}: {message}")]
    InvalidEntry { path: PathBuf, message: String },
}

impl ConfigError {
    /// Creates a new MalformedEntry error
    pub fn malformed_entry(url: impl Into<String>, index: usize, message: impl Into<String>) -> Self {
        ConfigError::MalformedEntry {
            url: url.into(),
            index,
            message: message.into(),
        }
    }

    /// Creates a new PolicyFetch error
    pub fn policy_fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::PolicyFetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a new PolicyParse error
    pub fn policy_parse(url: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::PolicyParse {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates a new File error
    pub fn file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ConfigError::File {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl RegistryError {
    /// Creates a new NetworkError
    pub fn network_error(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::NetworkError {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::InvalidResponse {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::Timeout {
            package: package.into(),
            registry: registry.into(),
        }
    }
}

impl ResolutionError {
    /// Creates a new NoValidVersion error
    pub fn no_valid_version(coordinates: impl ToString, current: impl ToString) -> Self {
        ResolutionError::NoValidVersion {
            coordinates: coordinates.to_string(),
            current: current.to_string(),
        }
    }

    /// Creates a new Task error
    pub fn task(message: impl Into<String>) -> Self {
        ResolutionError::Task {
            message: message.into(),
        }
    }
}

impl SnapshotError {
    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SnapshotError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SnapshotError::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new InvalidEntry error
    pub fn invalid_entry(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        SnapshotError::InvalidEntry {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_entry_names_url_and_index() {
        let err = ConfigError::malformed_entry("https://example.org/pins.json", 3, "missing field");
        let msg = err.to_string();
        assert!(msg.contains("#3"));
        assert!(msg.contains("https://example.org/pins.json"));
        assert!(msg.contains("missing field"));
    }

    #[test]
    fn test_incomplete_migration() {
        let err = ConfigError::IncompleteMigration {
            url: "migrations.json".to_string(),
            index: 0,
        };
        assert!(err.to_string().contains("groupIdBefore or artifactIdBefore"));
    }

    #[test]
    fn test_registry_error_timeout() {
        let err = RegistryError::timeout("org.typelevel:cats-core", "Maven Central");
        let msg = err.to_string();
        assert!(msg.contains("timeout"));
        assert!(msg.contains("cats-core"));
    }

    #[test]
    fn test_no_valid_version() {
        let err = ResolutionError::no_valid_version("org.typelevel::cats-core", "2.9.0");
        let msg = err.to_string();
        assert!(msg.contains("no valid version"));
        assert!(msg.contains("2.9.0"));
    }

    #[test]
    fn test_resolution_error_from_registry_error() {
        let err: ResolutionError = RegistryError::network_error("x", "Maven Central", "refused").into();
        assert!(matches!(err, ResolutionError::Lookup(_)));
        assert!(err.to_string().contains("refused"));
    }

    #[test]
    fn test_app_error_from_config_error() {
        let app_err: AppError = ConfigError::InvalidDuration {
            value: "bad".to_string(),
        }
        .into();
        assert!(app_err.to_string().contains("invalid duration format"));
    }

    #[test]
    fn test_app_error_from_snapshot_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let app_err: AppError = SnapshotError::read_error("/tmp/before.tsv", io).into();
        assert!(app_err.to_string().contains("failed to read snapshot"));
    }

    #[test]
    fn test_error_debug_trait() {
        let err = ResolutionError::Cancelled;
        assert!(format!("{:?}", err).contains("Cancelled"));
    }
}
