//! In-memory version source for unit tests

use super::VersionSource;
use crate::domain::{Coordinates, NumericVersion};
use crate::error::RegistryError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Serves fixed version lists and counts how often it is asked
#[derive(Default)]
pub(crate) struct FakeSource {
    versions: HashMap<Coordinates, Vec<String>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
    failing: bool,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, coordinates: Coordinates, versions: &[&str]) -> Self {
        self.versions
            .insert(coordinates, versions.iter().map(|v| v.to_string()).collect());
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VersionSource for FakeSource {
    async fn find(
        &self,
        coordinates: &Coordinates,
        _plugin: bool,
    ) -> Result<Vec<NumericVersion>, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing {
            return Err(RegistryError::network_error(
                coordinates.to_string(),
                "fake",
                "connection refused",
            ));
        }
        Ok(self
            .versions
            .get(coordinates)
            .map(|raw| {
                raw.iter()
                    .filter_map(|v| NumericVersion::parse(v))
                    .collect()
            })
            .unwrap_or_default())
    }
}
