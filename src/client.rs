//! The ISO registry HTTP client.

use crate::error::{IsoError, Result};
use reqwest::Client;
use std::time::Duration;

/// Path of the advanced-search endpoint on the registry host.
pub(crate) const SEARCH_PATH: &str = "/cms/render/live/en/sites/isoorg.advancedSearch.do";

/// Async client for the ISO standards registry.
///
/// # Example
///
/// ```no_run
/// # async fn example() -> isobib_client::error::Result<()> {
/// let client = isobib_client::IsoClient::new();
/// let hits = client.search("ISO 19115-1").await?;
/// for hit in hits.iter() {
///     println!("{}", hit.raw().doc_ref);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct IsoClient {
    pub(crate) http: Client,
    pub(crate) base_url: String,
}

impl IsoClient {
    /// Create a new client pointed at `www.iso.org`.
    pub fn new() -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: "https://www.iso.org".to_string(),
        }
    }

    /// Override the base URL (useful for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Make a GET request to the registry.
    ///
    /// Query parameters are URL-escaped by the underlying client. Any
    /// transport failure or non-2xx status is normalized into
    /// [`IsoError::Request`].
    pub(crate) async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json, text/plain, */*")
            .header("User-Agent", "isobib-client/0.1.0")
            .query(params)
            .send()
            .await
            .map_err(|e| IsoError::Request {
                url: self.base_url.clone(),
                source: Some(e),
            })?;

        if !response.status().is_success() {
            return Err(IsoError::Request {
                url: self.base_url.clone(),
                source: response.error_for_status().err(),
            });
        }

        response.text().await.map_err(|e| IsoError::Request {
            url: self.base_url.clone(),
            source: Some(e),
        })
    }
}

impl Default for IsoClient {
    fn default() -> Self {
        Self::new()
    }
}
