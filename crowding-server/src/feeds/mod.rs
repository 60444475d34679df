//! Upstream feed clients.
//!
//! Three upstreams are consulted:
//! - the real-time train schedule, per (line, station), cached in 30-second
//!   buckets
//! - the public holiday calendar, cached for a day
//! - the current weather report, fetched on demand
//!
//! Each client sits behind a trait so the caches can be exercised with fake
//! feeds. Failures never escape this module: callers see an unavailable
//! schedule, the last known holidays, or dry weather.

mod error;
mod holiday;
mod http;
mod schedule;
mod schedule_cache;
mod weather;

pub use error::FeedError;
pub use holiday::{
    DEFAULT_HOLIDAY_URL, HolidayCache, HolidayCacheConfig, HolidayCalendar, HolidayClient,
    HolidayFeed,
};
pub use http::{DEFAULT_TIMEOUT_SECS, FeedConfig};
pub use schedule::{
    DEFAULT_SCHEDULE_URL, FEED_TIME_FORMAT, LineStationData, RawArrival, ScheduleClient,
    ScheduleFeed, ScheduleResponse,
};
pub use schedule_cache::{CachedScheduleClient, ScheduleCacheConfig};
pub use weather::{
    DEFAULT_WEATHER_URL, RAINFALL_THRESHOLD_MM, RAINSTORM_KEYWORDS, REFERENCE_DISTRICTS,
    WeatherClient, WeatherFeed, WeatherReport, WeatherService, WeatherStatus,
};
