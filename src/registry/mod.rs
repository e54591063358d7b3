//! Version sources for artifact version discovery
//!
//! This module provides:
//! - HTTP client shared foundation
//! - Maven Central search adapter
//! - The resolution pipeline (timeout, cache, ignore, retraction, pin layers)

mod client;
mod maven_central;
pub mod pipeline;
#[cfg(test)]
pub(crate) mod testing;

pub use client::{HttpClient, DEFAULT_TIMEOUT};
pub use maven_central::{BinaryVersions, MavenCentralSource};
pub use pipeline::{Pipeline, PipelineBuilder};

use crate::domain::{Coordinates, NumericVersion};
use crate::error::RegistryError;
use async_trait::async_trait;

/// Anything that can list the published versions of an artifact
#[async_trait]
pub trait VersionSource: Send + Sync {
    /// Published versions of `coordinates`, in source order.
    ///
    /// `plugin` selects the build-plugin naming scheme. An unknown artifact
    /// yields an empty list rather than an error.
    async fn find(
        &self,
        coordinates: &Coordinates,
        plugin: bool,
    ) -> Result<Vec<NumericVersion>, RegistryError>;
}
