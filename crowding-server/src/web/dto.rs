//! Data transfer objects for web requests and responses.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::CrowdingLevel;

/// Query for listing readings.
#[derive(Debug, Default, Deserialize)]
pub struct FlowListParams {
    pub station_code: Option<String>,

    /// Inclusive lower bound, `YYYY-MM-DDTHH:MM:SS`
    pub start_time: Option<String>,

    /// Inclusive upper bound, `YYYY-MM-DDTHH:MM:SS`
    pub end_time: Option<String>,

    /// Maximum readings to return (defaults to 100)
    pub limit: Option<usize>,
}

/// Query for deleting old readings.
#[derive(Debug, Default, Deserialize)]
pub struct CleanupParams {
    /// Delete readings older than this many hours
    pub hours: Option<i64>,
}

/// A reading submitted over HTTP.
///
/// Codes are plain strings here so malformed ones can be reported as a bad
/// request rather than a decode failure.
#[derive(Debug, Deserialize)]
pub struct CreateFlowRequest {
    pub station_code: String,

    #[serde(default)]
    pub line_code: Option<String>,

    /// Defaults to the current network time
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,

    /// Classified by the server when absent
    #[serde(default)]
    pub crowding_level: Option<CrowdingLevel>,

    #[serde(default)]
    pub train_frequency: Option<f64>,

    #[serde(default)]
    pub next_train_minutes: Option<f64>,

    #[serde(default)]
    pub is_delay: Option<bool>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: NaiveDateTime,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Parse a timestamp given as `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD HH:MM:SS`.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    s.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}
