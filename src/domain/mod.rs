//! Core domain models for depgov
//!
//! This module contains the fundamental types used throughout the engine:
//! - Artifact coordinates
//! - Version model (numeric versions, markers, variables) and its ordering
//! - Dependency structures
//! - Version patterns and policy entries (ignores, retractions, pins, migrations)

mod coordinates;
mod dependency;
mod pattern;
mod policy;
mod version;

pub use coordinates::{Coordinates, DEFAULT_CONFIGURATION};
pub use dependency::{Dependency, DependencyRecord, DEFAULT_GROUP};
pub use pattern::VersionPattern;
pub use policy::{ArtifactFilter, ArtifactMigration, IgnoredVersion, RetractedArtifact, UpdatePin};
pub use version::{marker_accepts, Marker, NumericVersion, Version};
