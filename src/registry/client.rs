//! HTTP client shared foundation
//!
//! This module provides a shared HTTP client with:
//! - Configurable timeout and User-Agent
//! - Status code to RegistryError mapping
//!
//! No retries: a failed lookup fails the run.

use crate::error::RegistryError;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("depgov/", env!("CARGO_PKG_VERSION"));

/// HTTP client wrapper
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, RegistryError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                RegistryError::network_error(
                    "",
                    "HTTP client",
                    format!("failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self { client })
    }

    /// Create a client with the default User-Agent and a custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, RegistryError> {
        Self::with_config(timeout, DEFAULT_USER_AGENT)
    }

    /// Perform a GET request; Ok(None) when the resource does not exist
    pub async fn get_optional(
        &self,
        url: &str,
        package: &str,
        registry: &str,
    ) -> Result<Option<reqwest::Response>, RegistryError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                RegistryError::timeout(package, registry)
            } else {
                RegistryError::network_error(package, registry, e.to_string())
            }
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response)),
            status => Err(RegistryError::network_error(
                package,
                registry,
                format!("HTTP {}", status),
            )),
        }
    }

    /// Perform a GET request and parse the JSON body; Ok(None) on 404
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        package: &str,
        registry: &str,
    ) -> Result<Option<T>, RegistryError> {
        let Some(response) = self.get_optional(url, package, registry).await? else {
            return Ok(None);
        };
        response.json::<T>().await.map(Some).map_err(|e| {
            RegistryError::invalid_response(package, registry, format!("failed to parse JSON: {}", e))
        })
    }

    /// Perform a GET request and return the body text; 404 is an error here
    pub async fn get_text(
        &self,
        url: &str,
        package: &str,
        registry: &str,
    ) -> Result<String, RegistryError> {
        let response = self
            .get_optional(url, package, registry)
            .await?
            .ok_or_else(|| RegistryError::network_error(package, registry, "HTTP 404 Not Found"))?;
        response.text().await.map_err(|e| {
            RegistryError::invalid_response(
                package,
                registry,
                format!("failed to get text response: {}", e),
            )
        })
    }
}
