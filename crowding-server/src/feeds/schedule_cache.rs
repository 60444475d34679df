//! Caching layer for schedule responses.
//!
//! Time bucketing (30-second buckets) bounds the upstream call rate while
//! keeping results live to within one bucket. Failed lookups are cached too,
//! so a failing upstream is polled at most once per bucket.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::{debug, error, warn};

use crate::clock::Clock;
use crate::domain::{LineCode, StationCode};

use super::error::FeedError;
use super::schedule::{ScheduleFeed, ScheduleResponse};

/// Cache key: (line, station, time bucket).
type ScheduleKey = (LineCode, StationCode, i64);

/// `None` records an unavailable schedule.
type ScheduleEntry = Option<Arc<ScheduleResponse>>;

/// Configuration for the schedule cache.
#[derive(Debug, Clone)]
pub struct ScheduleCacheConfig {
    /// Time bucket size in seconds.
    pub bucket_secs: i64,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for ScheduleCacheConfig {
    fn default() -> Self {
        Self {
            bucket_secs: 30,
            max_capacity: 100,
        }
    }
}

/// Schedule feed with per-bucket caching.
///
/// Never fails: network errors, decode errors and non-success payloads are
/// logged and reported as an unavailable schedule.
pub struct CachedScheduleClient {
    feed: Arc<dyn ScheduleFeed>,
    clock: Arc<dyn Clock>,
    schedules: MokaCache<ScheduleKey, ScheduleEntry>,
    bucket_secs: i64,
}

impl CachedScheduleClient {
    pub fn new(
        feed: Arc<dyn ScheduleFeed>,
        clock: Arc<dyn Clock>,
        config: &ScheduleCacheConfig,
    ) -> Self {
        let bucket_secs = config.bucket_secs.max(1);
        // Entries older than two buckets can never be hit again.
        let ttl = Duration::from_secs((bucket_secs * 2) as u64);

        let schedules = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(ttl)
            .build();

        Self {
            feed,
            clock,
            schedules,
            bucket_secs,
        }
    }

    /// Bucket index of the current instant.
    fn time_bucket(&self) -> i64 {
        self.clock
            .now()
            .and_utc()
            .timestamp()
            .div_euclid(self.bucket_secs)
    }

    /// Schedule of `line` at `station`, or `None` when unavailable.
    pub async fn schedule(
        &self,
        line: LineCode,
        station: StationCode,
    ) -> Option<Arc<ScheduleResponse>> {
        let key = (line, station, self.time_bucket());

        self.schedules
            .get_with(key, async move {
                debug!(%line, %station, "fetching schedule");
                match self.feed.fetch_schedule(line, station).await {
                    Ok(response) => Some(Arc::new(response)),
                    Err(FeedError::Unsuccessful { message }) => {
                        warn!(
                            %line,
                            %station,
                            %message,
                            "schedule feed returned non-success status"
                        );
                        None
                    }
                    Err(e) => {
                        error!(%line, %station, error = %e, "failed to fetch schedule");
                        None
                    }
                }
            })
            .await
    }
}
