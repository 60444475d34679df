//! Server configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::clock::DEFAULT_UTC_OFFSET_HOURS;
use crate::feeds::{
    DEFAULT_HOLIDAY_URL, DEFAULT_SCHEDULE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_WEATHER_URL,
};

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// Default age (hours) past which readings are cleaned up.
pub const DEFAULT_RETENTION_HOURS: i64 = 24;

/// Configuration for the crowding server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,

    /// Real-time schedule endpoint.
    pub schedule_url: String,

    /// Public holiday calendar endpoint.
    pub holiday_url: String,

    /// Current weather endpoint.
    pub weather_url: String,

    /// Per-request timeout for every feed, in seconds.
    pub feed_timeout_secs: u64,

    /// Reference table to load instead of the built-in one.
    pub reference_path: Option<PathBuf>,

    /// Offset of network local time from UTC.
    pub utc_offset_hours: i32,

    /// Default cleanup age, in hours.
    pub retention_hours: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            schedule_url: DEFAULT_SCHEDULE_URL.to_string(),
            holiday_url: DEFAULT_HOLIDAY_URL.to_string(),
            weather_url: DEFAULT_WEATHER_URL.to_string(),
            feed_timeout_secs: DEFAULT_TIMEOUT_SECS,
            reference_path: None,
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            retention_hours: DEFAULT_RETENTION_HOURS,
        }
    }
}

impl ServerConfig {
    /// Read configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// anything unset or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: parsed(&lookup, "CROWDING_BIND_ADDR", defaults.bind_addr),
            schedule_url: lookup("MTR_SCHEDULE_URL").unwrap_or(defaults.schedule_url),
            holiday_url: lookup("HOLIDAY_CALENDAR_URL").unwrap_or(defaults.holiday_url),
            weather_url: lookup("WEATHER_URL").unwrap_or(defaults.weather_url),
            feed_timeout_secs: parsed(&lookup, "FEED_TIMEOUT_SECS", defaults.feed_timeout_secs),
            reference_path: lookup("REFERENCE_DATA_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            utc_offset_hours: parsed(&lookup, "UTC_OFFSET_HOURS", defaults.utc_offset_hours),
            retention_hours: parsed(&lookup, "FLOW_RETENTION_HOURS", defaults.retention_hours),
        }
    }

}

fn parsed<T: FromStr + Copy + std::fmt::Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(key, value = %raw, %default, "invalid configuration value, using default");
            default
        }
    }
}
