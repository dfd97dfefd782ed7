//! HTTP client wrapper for fetching photos.
//!
//! This module provides the `HttpClient` struct which owns the timeout
//! configuration for every request to the photo host. A hung connection
//! always ends in [`TransportError::Timeout`] instead of pinning a worker.

use std::time::Duration;

use reqwest::{Client, Response};
use tracing::{debug, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::TransportError;
use crate::user_agent;

/// HTTP client for photo fetches.
///
/// Created once and cloned into every worker; clones share one connection pool.
///
/// # Example
///
/// ```no_run
/// use harvester_core::fetch::HttpClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new()?;
/// let bytes = client.get_bytes("https://example.com/123_abc_n.jpg").await?;
/// println!("fetched {} bytes", bytes.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client with the default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Total request timeout: 5 minutes
    /// - Gzip decompression: enabled
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error if the TLS backend cannot initialize.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeouts(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            Duration::from_secs(READ_TIMEOUT_SECS),
        )
    }

    /// Creates a client with explicit timeouts.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error if the TLS backend cannot initialize.
    #[instrument(level = "debug")]
    pub fn with_timeouts(
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()?;
        Ok(Self { client })
    }

    /// Sends a GET request and checks the status.
    ///
    /// The returned response body has not been read yet.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server returns a non-2xx status
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    pub async fn get(&self, url: &str) -> Result<Response, TransportError> {
        Url::parse(url).map_err(|_| TransportError::invalid_url(url))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "non-success status");
            return Err(TransportError::http_status(url, status.as_u16()));
        }

        Ok(response)
    }

    /// Fetches the whole response body into memory.
    ///
    /// Meant for thumbnails, which are small and must be decoded before
    /// anything is written.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get), plus [`TransportError::Network`] or
    /// [`TransportError::Timeout`] if reading the body fails.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let response = self.get(url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::network(url, e))?;
        Ok(body.to_vec())
    }
}
