//! Shared HTTP plumbing for the feed clients.

use std::time::Duration;

use serde::de::DeserializeOwned;

use super::error::FeedError;

/// Default per-request timeout for upstream calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Connection settings for one upstream feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Endpoint URL
    pub url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl FeedConfig {
    /// Create a config for the given endpoint with the default timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Build an HTTP client honouring the feed's timeout.
pub(crate) fn build_http(config: &FeedConfig) -> Result<reqwest::Client, FeedError> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(http)
}

/// GET `url` with query parameters and decode the JSON body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
    query: &[(&str, &str)],
) -> Result<T, FeedError> {
    let response = http.get(url).query(query).send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(FeedError::Api {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| FeedError::Json {
        message: e.to_string(),
    })
}
