//! Persistence boundary for flow readings.
//!
//! The engine only needs three things from storage: the most recent readings
//! (optionally for one station), writing a reading, and deleting readings
//! older than a cutoff. [`InMemoryFlowStore`] backs the server and the tests.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::RwLock;

use crate::domain::{FlowReading, StationCode};

/// Errors from the flow store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Filter for listing readings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowQuery {
    pub station: Option<StationCode>,
    /// Inclusive lower bound.
    pub start: Option<NaiveDateTime>,
    /// Inclusive upper bound.
    pub end: Option<NaiveDateTime>,
    pub limit: usize,
}

impl FlowQuery {
    /// Most recent `limit` readings of `station`.
    pub fn recent(station: StationCode, limit: usize) -> Self {
        Self {
            station: Some(station),
            start: None,
            end: None,
            limit,
        }
    }

    fn matches(&self, reading: &FlowReading) -> bool {
        self.station.is_none_or(|s| reading.station_code == s)
            && self.start.is_none_or(|start| reading.timestamp >= start)
            && self.end.is_none_or(|end| reading.timestamp <= end)
    }
}

/// Storage of flow readings.
#[async_trait]
pub trait FlowStore: Send + Sync {
    /// Matching readings, newest first. Readings with equal timestamps are
    /// returned most recently written first.
    async fn query(&self, query: &FlowQuery) -> Result<Vec<FlowReading>, StoreError>;

    async fn insert(&self, reading: FlowReading) -> Result<FlowReading, StoreError>;

    /// Delete readings strictly older than `cutoff`, returning how many went.
    async fn delete_older_than(&self, cutoff: NaiveDateTime) -> Result<usize, StoreError>;

    /// Most recent `limit` readings of `station`, newest first.
    async fn recent_for_station(
        &self,
        station: StationCode,
        limit: usize,
    ) -> Result<Vec<FlowReading>, StoreError> {
        self.query(&FlowQuery::recent(station, limit)).await
    }
}

/// Flow store held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryFlowStore {
    readings: RwLock<Vec<FlowReading>>,
}

impl InMemoryFlowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlowStore for InMemoryFlowStore {
    async fn query(&self, query: &FlowQuery) -> Result<Vec<FlowReading>, StoreError> {
        let readings = self.readings.read().await;

        let mut matching: Vec<FlowReading> = readings
            .iter()
            .rev()
            .filter(|r| query.matches(r))
            .cloned()
            .collect();
        // Stable sort keeps newer writes ahead on equal timestamps.
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.truncate(query.limit);

        Ok(matching)
    }

    async fn insert(&self, reading: FlowReading) -> Result<FlowReading, StoreError> {
        self.readings.write().await.push(reading.clone());
        Ok(reading)
    }

    async fn delete_older_than(&self, cutoff: NaiveDateTime) -> Result<usize, StoreError> {
        let mut readings = self.readings.write().await;
        let before = readings.len();
        readings.retain(|r| r.timestamp >= cutoff);
        Ok(before - readings.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CrowdingLevel, LineCode};
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn cen() -> StationCode {
        StationCode::parse("CEN").unwrap()
    }

    async fn insert(
        store: &InMemoryFlowStore,
        station: &str,
        line: &str,
        at: NaiveDateTime,
        level: CrowdingLevel,
    ) {
        let reading = FlowReading {
            station_code: StationCode::parse(station).unwrap(),
            line_code: Some(LineCode::parse(line).unwrap()),
            timestamp: at,
            crowding_level: level,
            train_frequency: None,
            next_train_minutes: None,
            is_delay: false,
        };
        store.insert(reading).await.unwrap();
    }

    #[tokio::test]
    async fn recent_is_newest_first_and_limited() {
        let store = InMemoryFlowStore::new();
        insert(&store, "CEN", "ISL", ts(8, 0), CrowdingLevel::Low).await;
        insert(&store, "CEN", "TWL", ts(8, 10), CrowdingLevel::High).await;
        insert(&store, "ADM", "ISL", ts(8, 20), CrowdingLevel::Medium).await;
        insert(&store, "CEN", "ISL", ts(8, 5), CrowdingLevel::Medium).await;

        let recent = store.recent_for_station(cen(), 2).await.unwrap();

        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].timestamp, ts(8, 10));
        assert_eq!(recent[1].timestamp, ts(8, 5));
    }

    #[tokio::test]
    async fn equal_timestamps_prefer_latest_write() {
        let store = InMemoryFlowStore::new();
        insert(&store, "CEN", "ISL", ts(9, 0), CrowdingLevel::Low).await;
        insert(&store, "CEN", "ISL", ts(9, 0), CrowdingLevel::High).await;

        let recent = store.recent_for_station(cen(), 10).await.unwrap();
        assert_eq!(recent[0].crowding_level, CrowdingLevel::High);
    }

    #[tokio::test]
    async fn query_time_range() {
        let store = InMemoryFlowStore::new();
        for m in [0, 10, 20, 30] {
            insert(&store, "CEN", "ISL", ts(10, m), CrowdingLevel::Low).await;
        }

        let query = FlowQuery {
            station: None,
            start: Some(ts(10, 10)),
            end: Some(ts(10, 20)),
            limit: 100,
        };
        let found = store.query(&query).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].timestamp, ts(10, 20));
    }

    #[tokio::test]
    async fn delete_older_than_cutoff() {
        let store = InMemoryFlowStore::new();
        insert(&store, "CEN", "ISL", ts(6, 0), CrowdingLevel::Low).await;
        insert(&store, "CEN", "ISL", ts(7, 0), CrowdingLevel::Low).await;
        insert(&store, "CEN", "ISL", ts(8, 0), CrowdingLevel::Low).await;

        let deleted = store.delete_older_than(ts(7, 0)).await.unwrap();
        assert_eq!(deleted, 1);

        let remaining = store.recent_for_station(cen(), 10).await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[1].timestamp, ts(7, 0));
    }
}
