//! Policy document decoding
//!
//! A policy document is a JSON (or TOML) table whose top-level keys hold
//! arrays of entries: `migrations`, `retractions`, `pins`, `ignores`.
//! Entries are decoded one by one so a single bad entry only costs itself.

use crate::domain::{ArtifactMigration, IgnoredVersion, RetractedArtifact, UpdatePin};
use crate::error::ConfigError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Serialization format of a policy document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Toml,
}

impl DocumentFormat {
    /// TOML when the location ends in `.toml`, JSON otherwise
    pub fn from_location(location: &str) -> Self {
        if location.to_ascii_lowercase().ends_with(".toml") {
            DocumentFormat::Toml
        } else {
            DocumentFormat::Json
        }
    }
}

/// An entry kind that can appear in a policy document
pub trait PolicyEntry: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Top-level key holding entries of this kind
    const KEY: &'static str;

    /// Checks constraints serde cannot express
    fn validate(&self, _url: &str, _index: usize) -> Result<(), ConfigError> {
        Ok(())
    }
}

impl PolicyEntry for ArtifactMigration {
    const KEY: &'static str = "migrations";

    fn validate(&self, url: &str, index: usize) -> Result<(), ConfigError> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(ConfigError::IncompleteMigration {
                url: url.to_string(),
                index,
            })
        }
    }
}

impl PolicyEntry for RetractedArtifact {
    const KEY: &'static str = "retractions";
}

impl PolicyEntry for UpdatePin {
    const KEY: &'static str = "pins";
}

impl PolicyEntry for IgnoredVersion {
    const KEY: &'static str = "ignores";
}

/// Entries decoded from one document, plus the per-entry problems skipped
#[derive(Debug, Clone)]
pub struct ParsedDocument<T> {
    pub entries: Vec<T>,
    pub warnings: Vec<ConfigError>,
}

/// Decodes the entries of kind `T` from a document.
///
/// Fails only when the document as a whole is unreadable. Entries that fail
/// to decode or validate are skipped, logged and reported in `warnings`.
pub fn parse_document<T: PolicyEntry>(
    url: &str,
    text: &str,
    format: DocumentFormat,
) -> Result<ParsedDocument<T>, ConfigError> {
    let root = parse_root(url, text, format)?;

    let items = match root.get(T::KEY) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(_) => {
            return Err(ConfigError::policy_parse(
                url,
                format!("'{}' must be an array", T::KEY),
            ))
        }
    };

    let mut entries = Vec::with_capacity(items.len());
    let mut warnings = Vec::new();
    for (index, item) in items.into_iter().enumerate() {
        let decoded = serde_json::from_value::<T>(item)
            .map_err(|e| ConfigError::malformed_entry(url, index, e.to_string()))
            .and_then(|entry| entry.validate(url, index).map(|()| entry));
        match decoded {
            Ok(entry) => entries.push(entry),
            Err(warning) => {
                tracing::warn!("{}", warning);
                warnings.push(warning);
            }
        }
    }

    tracing::debug!("loaded {} {} from {}", entries.len(), T::KEY, url);
    Ok(ParsedDocument { entries, warnings })
}

fn parse_root(url: &str, text: &str, format: DocumentFormat) -> Result<Value, ConfigError> {
    let root = match format {
        DocumentFormat::Json => serde_json::from_str::<Value>(text)
            .map_err(|e| ConfigError::policy_parse(url, e.to_string()))?,
        DocumentFormat::Toml => {
            let table = toml::from_str::<toml::Table>(text)
                .map_err(|e| ConfigError::policy_parse(url, e.to_string()))?;
            serde_json::to_value(table).map_err(|e| ConfigError::policy_parse(url, e.to_string()))?
        }
    };
    if root.is_object() {
        Ok(root)
    } else {
        Err(ConfigError::policy_parse(url, "expected a table at the top level"))
    }
}
