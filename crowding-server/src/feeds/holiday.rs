//! Public holiday calendar.
//!
//! The calendar is an iCal-as-JSON document; only each event's start date
//! matters:
//!
//! ```json
//! {"vcalendar": [{"vevent": [{"dtstart": ["20260101", {"value": "DATE"}], "summary": "..."}]}]}
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::clock::Clock;

use super::error::FeedError;
use super::http::{FeedConfig, build_http, get_json};

/// Default endpoint of the holiday calendar.
pub const DEFAULT_HOLIDAY_URL: &str = "https://www.1823.gov.hk/common/ical/en.json";

/// Calendar document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HolidayCalendar {
    #[serde(default)]
    pub vcalendar: Vec<CalendarBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarBody {
    #[serde(default)]
    pub vevent: Vec<CalendarEvent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalendarEvent {
    /// `["YYYYMMDD", {...}]`
    #[serde(default)]
    pub dtstart: Value,
}

impl HolidayCalendar {
    /// Start dates of every event; unparseable entries are skipped.
    pub fn dates(&self) -> HashSet<NaiveDate> {
        self.vcalendar
            .first()
            .map(|body| {
                body.vevent
                    .iter()
                    .filter_map(|event| event.dtstart.get(0)?.as_str())
                    .filter_map(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y%m%d").ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Source of holiday dates.
#[async_trait]
pub trait HolidayFeed: Send + Sync {
    async fn fetch_holidays(&self) -> Result<HashSet<NaiveDate>, FeedError>;
}

/// HTTP client for the holiday calendar.
#[derive(Debug, Clone)]
pub struct HolidayClient {
    http: reqwest::Client,
    url: String,
}

impl HolidayClient {
    pub fn new(config: FeedConfig) -> Result<Self, FeedError> {
        Ok(Self {
            http: build_http(&config)?,
            url: config.url,
        })
    }
}

#[async_trait]
impl HolidayFeed for HolidayClient {
    async fn fetch_holidays(&self) -> Result<HashSet<NaiveDate>, FeedError> {
        let calendar: HolidayCalendar = get_json(&self.http, &self.url, &[]).await?;
        Ok(calendar.dates())
    }
}

/// Configuration for the holiday cache.
#[derive(Debug, Clone)]
pub struct HolidayCacheConfig {
    /// Age after which the calendar is fetched again.
    pub max_age: Duration,
}

impl Default for HolidayCacheConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::hours(24),
        }
    }
}

#[derive(Debug, Default)]
struct HolidayState {
    dates: HashSet<NaiveDate>,
    fetched_at: Option<NaiveDateTime>,
}

/// Holiday dates cached for a day.
///
/// Refreshes when empty or stale. A failed refresh keeps whatever was there
/// before, which is an empty set on a cold start.
pub struct HolidayCache {
    feed: Arc<dyn HolidayFeed>,
    clock: Arc<dyn Clock>,
    max_age: Duration,
    state: Mutex<HolidayState>,
}

impl HolidayCache {
    pub fn new(
        feed: Arc<dyn HolidayFeed>,
        clock: Arc<dyn Clock>,
        config: &HolidayCacheConfig,
    ) -> Self {
        Self {
            feed,
            clock,
            max_age: config.max_age,
            state: Mutex::new(HolidayState::default()),
        }
    }

    /// Current holiday dates, refreshing first when needed.
    pub async fn holidays(&self) -> HashSet<NaiveDate> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;

        let stale = match state.fetched_at {
            None => true,
            Some(at) => now - at > self.max_age,
        };

        if state.dates.is_empty() || stale {
            match self.feed.fetch_holidays().await {
                Ok(dates) => {
                    info!(count = dates.len(), "refreshed holiday cache");
                    state.dates = dates;
                    state.fetched_at = Some(now);
                }
                Err(e) => {
                    error!(
                        error = %e,
                        cached = state.dates.len(),
                        "failed to fetch public holidays"
                    );
                }
            }
        }

        state.dates.clone()
    }

    /// Whether `date` is a public holiday.
    pub async fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays().await.contains(&date)
    }

    /// Whether today (per the clock) is a public holiday.
    pub async fn is_today_holiday(&self) -> bool {
        let today = self.clock.now().date();
        self.is_holiday(today).await
    }
}
