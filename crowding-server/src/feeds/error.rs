//! Feed client error types.

/// Errors from an upstream feed.
///
/// These never leave the feed layer: each cached client turns them into its
/// documented fallback value.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Payload carried an explicit non-success status
    #[error("upstream reported failure: {message}")]
    Unsuccessful { message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },
}
