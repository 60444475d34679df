//! Per-line schedule resolution for a station.
//!
//! Looks up the lines serving a station, fetches each line's schedule through
//! the cached client and attaches a headway estimate per direction. Lines
//! whose schedule is unavailable are skipped; a station with no resolvable
//! lines still produces a result, with an empty line list.

use std::sync::Arc;

use chrono::NaiveDateTime;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::domain::{ArrivalRecord, LineCode, StationCode};
use crate::feeds::{CachedScheduleClient, RawArrival, ScheduleResponse};
use crate::headway::estimate_headway;
use crate::reference::ReferenceData;

/// One line's state at one station at one poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSnapshot {
    pub line_code: LineCode,
    pub line_name: String,
    pub color: String,
    /// Valid up-direction arrivals, in feed order.
    pub up_trains: Vec<ArrivalRecord>,
    /// Valid down-direction arrivals, in feed order.
    pub down_trains: Vec<ArrivalRecord>,
    /// Up-direction headway in minutes, when estimable.
    pub frequency_up: Option<f64>,
    /// Down-direction headway in minutes, when estimable.
    pub frequency_down: Option<f64>,
    /// Whether the line reports a delay.
    pub is_delay: bool,
}

impl LineSnapshot {
    /// Shortest headway across both directions.
    pub fn headway(&self) -> Option<f64> {
        min_of([self.frequency_up, self.frequency_down].into_iter().flatten())
    }

    /// Minutes until the next train in either direction.
    pub fn next_train_minutes(&self) -> Option<f64> {
        min_of(
            self.up_trains
                .iter()
                .chain(&self.down_trains)
                .filter_map(|t| t.ttnt)
                .filter(|t| t.is_finite()),
        )
    }
}

/// Every resolvable line at a station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationTrains {
    pub station_code: StationCode,
    pub station_name: String,
    /// Server time of the first fetched schedule, else local time.
    pub timestamp: NaiveDateTime,
    pub lines: Vec<LineSnapshot>,
}

pub(crate) fn min_of(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |acc, v| match acc {
        Some(m) if m <= v => Some(m),
        _ => Some(v),
    })
}

/// Builds [`StationTrains`] from live schedules.
#[derive(Clone)]
pub struct ScheduleResolver {
    schedules: Arc<CachedScheduleClient>,
    reference: Arc<ReferenceData>,
    clock: Arc<dyn Clock>,
}

impl ScheduleResolver {
    pub fn new(
        schedules: Arc<CachedScheduleClient>,
        reference: Arc<ReferenceData>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            schedules,
            reference,
            clock,
        }
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Resolve every line serving `station`.
    pub async fn resolve(&self, station: StationCode) -> StationTrains {
        let station_name = self.reference.station_name(station);
        let line_codes = self.reference.lines_for(station);

        if line_codes.is_empty() {
            warn!(%station, "no lines found for station");
            return StationTrains {
                station_code: station,
                station_name,
                timestamp: self.clock.now(),
                lines: Vec::new(),
            };
        }

        // Fetched concurrently; join_all keeps the reference line order.
        let responses = join_all(
            line_codes
                .iter()
                .map(|&line| async move { (line, self.schedules.schedule(line, station).await) }),
        )
        .await;

        let timestamp = responses
            .iter()
            .find_map(|(_, response)| response.as_ref())
            .and_then(|response| response.server_time())
            .unwrap_or_else(|| self.clock.now());

        let lines = responses
            .into_iter()
            .filter_map(|(line, response)| {
                let Some(response) = response else {
                    debug!(%line, %station, "schedule unavailable, skipping line");
                    return None;
                };
                self.snapshot(line, station, &response)
            })
            .collect();

        StationTrains {
            station_code: station,
            station_name,
            timestamp,
            lines,
        }
    }

    fn snapshot(
        &self,
        line: LineCode,
        station: StationCode,
        response: &ScheduleResponse,
    ) -> Option<LineSnapshot> {
        let Some(data) = response.line_data(line, station) else {
            warn!(%line, %station, "no data for line-station pair in schedule response");
            return None;
        };

        let raw_up = to_records(&data.up);
        let raw_down = to_records(&data.down);
        let info = self.reference.line_info(line);

        Some(LineSnapshot {
            line_code: line,
            line_name: info.name,
            color: info.color,
            frequency_up: estimate_headway(&raw_up),
            frequency_down: estimate_headway(&raw_down),
            up_trains: raw_up.into_iter().filter(|t| t.valid).collect(),
            down_trains: raw_down.into_iter().filter(|t| t.valid).collect(),
            is_delay: response.reports_delay(),
        })
    }
}

fn to_records(raw: &[RawArrival]) -> Vec<ArrivalRecord> {
    raw.iter().map(RawArrival::to_record).collect()
}
