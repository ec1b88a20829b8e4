//! HTTP client for the puzzle page
//!
//! Fetches the raw HTML of the page that embeds the daily puzzle data. The
//! upstream serves different markup to non-browser clients, so every request
//! carries a browser-like `User-Agent`.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use thiserror::Error;

/// Default page that embeds the puzzle data
pub const DEFAULT_SOURCE_URL: &str = "https://www.nytimes.com/puzzles/letter-boxed";

/// Default `User-Agent` sent with page requests
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Default timeout for a page fetch in seconds
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Errors that can occur when fetching the page
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("{url} returned {status}")]
    Status { status: StatusCode, url: String },
}

/// Where and how to fetch the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

/// Client for fetching the puzzle page
#[derive(Debug, Clone)]
pub struct PuzzleClient {
    http_client: Client,
    url: String,
}

impl PuzzleClient {
    /// Creates a client from the given source configuration
    ///
    /// Fails only if the TLS backend cannot be initialised.
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let http_client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http_client,
            url: config.url.clone(),
        })
    }

    /// URL of the page this client fetches
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches the page body as text
    ///
    /// # Returns
    /// * `Ok(String)` - The decoded response body
    /// * `Err(SourceError)` - On transport failure, timeout or a non-2xx status
    pub async fn fetch_page(&self) -> Result<String, SourceError> {
        let response = self.http_client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status,
                url: self.url.clone(),
            });
        }

        Ok(response.text().await?)
    }
}
