//! Crowding engine.
//!
//! Composes the resolver, the context feeds, the classifier, the aggregator
//! and the flow store into the operations callers use.

use std::sync::Arc;

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::{AggregateError, aggregate};
use crate::classify::{CrowdingMetric, assess};
use crate::clock::Clock;
use crate::domain::{CrowdingContext, FlowReading, NewFlowReading, StationCode};
use crate::feeds::{HolidayCache, WeatherService, WeatherStatus};
use crate::reference::ReferenceData;
use crate::resolver::{LineSnapshot, ScheduleResolver, StationTrains};
use crate::store::{FlowQuery, FlowStore, StoreError};

/// Errors surfaced to callers of the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Nothing to report for the station
    #[error("no flow data found for station {0}")]
    NotFound(StationCode),

    /// No line at the station has schedule data
    #[error("no line data for station {0}")]
    NoLineData(StationCode),

    /// The cleanup age does not give a representable cutoff
    #[error("cleanup age out of range: {0} hours")]
    InvalidCleanupAge(i64),

    /// The flow store failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AggregateError> for EngineError {
    fn from(e: AggregateError) -> Self {
        match e {
            AggregateError::NotFound(station) => EngineError::NotFound(station),
        }
    }
}

/// Engine tuning.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How many recent readings are considered when aggregating a station.
    pub latest_window: usize,

    /// Upper bound on listed readings.
    pub max_list_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            latest_window: 20,
            max_list_limit: 1000,
        }
    }
}

/// Context signals as of now, with the weather they were derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextReport {
    pub timestamp: NaiveDateTime,
    pub context: CrowdingContext,
    pub weather: WeatherStatus,
}

/// Outcome of a cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub deleted_count: usize,
    pub cutoff_time: NaiveDateTime,
}

/// The crowding inference and aggregation engine.
#[derive(Clone)]
pub struct CrowdingEngine {
    resolver: ScheduleResolver,
    holidays: Arc<HolidayCache>,
    weather: WeatherService,
    store: Arc<dyn FlowStore>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl CrowdingEngine {
    pub fn new(
        resolver: ScheduleResolver,
        holidays: Arc<HolidayCache>,
        weather: WeatherService,
        store: Arc<dyn FlowStore>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        Self {
            resolver,
            holidays,
            weather,
            store,
            clock,
            config,
        }
    }

    /// Current network local time.
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    /// Static station and line tables.
    pub fn reference(&self) -> &ReferenceData {
        self.resolver.reference()
    }

    /// Context for a reading taken at `at`.
    async fn context_at(&self, at: NaiveDateTime, is_delay: bool) -> CrowdingContext {
        let is_holiday = self.holidays.is_holiday(at.date()).await;
        let weather = self.weather.status().await;

        CrowdingContext::at_hour(at.hour())
            .with_holiday(is_holiday)
            .with_rain(weather.is_rainy)
            .with_delay(is_delay)
    }

    /// Current context signals.
    pub async fn current_context(&self) -> ContextReport {
        let now = self.clock.now();
        let is_holiday = self.holidays.is_today_holiday().await;
        let weather = self.weather.status().await;

        ContextReport {
            timestamp: now,
            context: CrowdingContext::at_hour(now.hour())
                .with_holiday(is_holiday)
                .with_rain(weather.is_rainy),
            weather,
        }
    }

    /// Live arrivals at `station`.
    pub async fn station_trains(&self, station: StationCode) -> StationTrains {
        self.resolver.resolve(station).await
    }

    /// Store a reading, classifying it first when no level was supplied.
    pub async fn record(&self, new: NewFlowReading) -> Result<FlowReading, EngineError> {
        let level = match new.crowding_level {
            Some(level) => level,
            None => {
                let metric = CrowdingMetric::choose(new.train_frequency, new.next_train_minutes);
                let ctx = self
                    .context_at(new.timestamp, new.is_delay.unwrap_or(false))
                    .await;
                assess(metric, &ctx)
            }
        };

        let reading = new.into_reading(level);
        debug!(
            station = %reading.station_code,
            level = %reading.crowding_level,
            "recording reading"
        );
        Ok(self.store.insert(reading).await?)
    }

    /// Current station-wide reading, combining the latest reading per line.
    pub async fn latest(&self, station: StationCode) -> Result<FlowReading, EngineError> {
        let recent = self
            .store
            .recent_for_station(station, self.config.latest_window)
            .await?;
        Ok(aggregate(station, &recent)?)
    }

    /// List readings, newest first. The limit is capped.
    pub async fn history(&self, mut query: FlowQuery) -> Result<Vec<FlowReading>, EngineError> {
        query.limit = query.limit.min(self.config.max_list_limit);
        Ok(self.store.query(&query).await?)
    }

    /// Derive one reading per resolvable line at `station` without storing.
    pub async fn snapshot_station(&self, station: StationCode) -> Vec<FlowReading> {
        let trains = self.resolver.resolve(station).await;
        if trains.lines.is_empty() {
            return Vec::new();
        }

        let is_holiday = self.holidays.is_holiday(trains.timestamp.date()).await;
        let weather = self.weather.status().await;
        let base = CrowdingContext::at_hour(trains.timestamp.hour())
            .with_holiday(is_holiday)
            .with_rain(weather.is_rainy);

        trains
            .lines
            .iter()
            .map(|line| line_reading(station, trains.timestamp, line, base))
            .collect()
    }

    /// Snapshot `station` and store every reading.
    ///
    /// Fails when no line at the station could be resolved.
    pub async fn record_snapshot(
        &self,
        station: StationCode,
    ) -> Result<Vec<FlowReading>, EngineError> {
        let readings = self.snapshot_station(station).await;
        if readings.is_empty() {
            return Err(EngineError::NoLineData(station));
        }

        let mut stored = Vec::with_capacity(readings.len());
        for reading in readings {
            stored.push(self.store.insert(reading).await?);
        }
        info!(%station, count = stored.len(), "recorded station snapshot");
        Ok(stored)
    }

    /// Delete readings older than `hours` before now.
    ///
    /// Negative ages, and ages reaching past the representable dates, are
    /// rejected.
    pub async fn cleanup(&self, hours: i64) -> Result<CleanupReport, EngineError> {
        let cutoff_time = Duration::try_hours(hours)
            .filter(|_| hours >= 0)
            .and_then(|age| self.clock.now().checked_sub_signed(age))
            .ok_or(EngineError::InvalidCleanupAge(hours))?;
        let deleted_count = self.store.delete_older_than(cutoff_time).await?;
        info!(deleted_count, %cutoff_time, "cleaned up old readings");
        Ok(CleanupReport {
            deleted_count,
            cutoff_time,
        })
    }
}

/// Reading for one line of a snapshot.
fn line_reading(
    station: StationCode,
    timestamp: NaiveDateTime,
    line: &LineSnapshot,
    base: CrowdingContext,
) -> FlowReading {
    let train_frequency = line.headway();
    let next_train_minutes = line.next_train_minutes();
    let metric = CrowdingMetric::choose(train_frequency, next_train_minutes);

    FlowReading {
        station_code: station,
        line_code: Some(line.line_code),
        timestamp,
        crowding_level: assess(metric, &base.with_delay(line.is_delay)),
        train_frequency,
        next_train_minutes,
        is_delay: line.is_delay,
    }
}
