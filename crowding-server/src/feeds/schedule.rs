//! Real-time train schedule feed.
//!
//! The upstream answers one (line, station) pair per request:
//!
//! ```json
//! {
//!   "status": 1,
//!   "message": "successful",
//!   "curr_time": "2026-01-15 10:30:00",
//!   "isdelay": "N",
//!   "data": {
//!     "ISL-CEN": {
//!       "UP":   [{"seq": "1", "dest": "CHW", "plat": "2", "time": "...", "ttnt": "1", "valid": "Y"}],
//!       "DOWN": [...]
//!     }
//!   }
//! }
//! ```
//!
//! Numbers may arrive as JSON numbers or as strings, so arrival fields are
//! read leniently and anything unreadable becomes `None`.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{ArrivalRecord, LineCode, StationCode};

use super::error::FeedError;
use super::http::{FeedConfig, build_http, get_json};

/// Default endpoint of the real-time schedule feed.
pub const DEFAULT_SCHEDULE_URL: &str = "https://rt.data.gov.hk/v1/transport/mtr/getSchedule.php";

/// Format of the feed's clock times.
pub const FEED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Response of one schedule request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleResponse {
    /// 1 on success.
    #[serde(default)]
    pub status: Value,

    #[serde(default)]
    pub message: Option<String>,

    /// Server time of the response.
    #[serde(default)]
    pub curr_time: Option<String>,

    /// "Y" when the line reports a delay.
    #[serde(default, rename = "isdelay")]
    pub is_delay: Option<String>,

    /// Keyed by `"{LINE}-{STATION}"`. Kept loose because the shape varies
    /// when the request fails.
    #[serde(default)]
    pub data: Value,
}

/// Arrivals of one line at one station.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineStationData {
    #[serde(default, rename = "UP")]
    pub up: Vec<RawArrival>,

    #[serde(default, rename = "DOWN")]
    pub down: Vec<RawArrival>,
}

/// One arrival exactly as sent by the feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawArrival {
    #[serde(default)]
    pub seq: Value,
    #[serde(default)]
    pub ttnt: Value,
    #[serde(default)]
    pub valid: Value,
    #[serde(default)]
    pub plat: Value,
    #[serde(default)]
    pub dest: Value,
    #[serde(default)]
    pub time: Value,
}

impl ScheduleResponse {
    /// Whether the payload reports success.
    pub fn is_success(&self) -> bool {
        lenient_number(&self.status) == Some(1.0)
    }

    /// Server time of the response, if present and well-formed.
    pub fn server_time(&self) -> Option<NaiveDateTime> {
        let raw = self.curr_time.as_deref()?;
        NaiveDateTime::parse_from_str(raw.trim(), FEED_TIME_FORMAT).ok()
    }

    pub fn reports_delay(&self) -> bool {
        self.is_delay
            .as_deref()
            .is_some_and(|flag| flag.eq_ignore_ascii_case("Y"))
    }

    /// Arrivals for the given line and station, if the response has them.
    pub fn line_data(&self, line: LineCode, station: StationCode) -> Option<LineStationData> {
        let key = format!("{line}-{station}");
        let entry = self.data.get(&key)?;
        serde_json::from_value(entry.clone()).ok()
    }
}

impl RawArrival {
    /// Convert to a domain record, dropping unreadable numeric fields.
    pub fn to_record(&self) -> ArrivalRecord {
        ArrivalRecord {
            sequence: lenient_number(&self.seq)
                .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= u32::MAX as f64)
                .map(|n| n as u32),
            ttnt: lenient_number(&self.ttnt),
            valid: lenient_text(&self.valid) == "Y",
            platform: lenient_text(&self.plat),
            destination: lenient_text(&self.dest),
            time: lenient_text(&self.time),
        }
    }
}

/// Read a JSON number or a numeric string.
fn lenient_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

/// Read a JSON string or number as text; anything else is empty.
fn lenient_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Source of raw schedules.
#[async_trait]
pub trait ScheduleFeed: Send + Sync {
    /// Fetch the schedule of `line` at `station`.
    ///
    /// A payload with a non-success status is an error.
    async fn fetch_schedule(
        &self,
        line: LineCode,
        station: StationCode,
    ) -> Result<ScheduleResponse, FeedError>;
}

/// HTTP client for the real-time schedule feed.
#[derive(Debug, Clone)]
pub struct ScheduleClient {
    http: reqwest::Client,
    url: String,
}

impl ScheduleClient {
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        Ok(Self {
            http: build_http(&config)?,
            url: config.url,
        })
    }
}

#[async_trait]
impl ScheduleFeed for ScheduleClient {
    async fn fetch_schedule(
        &self,
        line: LineCode,
        station: StationCode,
    ) -> Result<ScheduleResponse, FeedError> {
        let response: ScheduleResponse = get_json(
            &self.http,
            &self.url,
            &[("line", line.as_str()), ("sta", station.as_str())],
        )
        .await?;

        if !response.is_success() {
            return Err(FeedError::Unsuccessful {
                message: response
                    .message
                    .clone()
                    .unwrap_or_else(|| "no message".to_string()),
            });
        }

        Ok(response)
    }
}
