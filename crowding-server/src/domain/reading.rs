//! Persisted crowding readings.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{CrowdingLevel, LineCode, StationCode};

/// One crowding reading for a station, optionally for a single line.
///
/// Readings sharing a station code and poll instant are distinguished by
/// `line_code`. A reading without a line code stands for the station as a
/// whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowReading {
    pub station_code: StationCode,
    #[serde(default)]
    pub line_code: Option<LineCode>,
    /// Network local time of the reading.
    pub timestamp: NaiveDateTime,
    pub crowding_level: CrowdingLevel,
    /// Headway in minutes.
    #[serde(default)]
    pub train_frequency: Option<f64>,
    #[serde(default)]
    pub next_train_minutes: Option<f64>,
    #[serde(default)]
    pub is_delay: bool,
}

/// A reading submitted by a caller; the crowding level may be left for the
/// engine to classify.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewFlowReading {
    pub station_code: StationCode,
    #[serde(default)]
    pub line_code: Option<LineCode>,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub crowding_level: Option<CrowdingLevel>,
    #[serde(default)]
    pub train_frequency: Option<f64>,
    #[serde(default)]
    pub next_train_minutes: Option<f64>,
    #[serde(default)]
    pub is_delay: Option<bool>,
}

impl NewFlowReading {
    /// Complete the reading with the given level.
    pub fn into_reading(self, crowding_level: CrowdingLevel) -> FlowReading {
        FlowReading {
            station_code: self.station_code,
            line_code: self.line_code,
            timestamp: self.timestamp,
            crowding_level,
            train_frequency: self.train_frequency,
            next_train_minutes: self.next_train_minutes,
            is_delay: self.is_delay.unwrap_or(false),
        }
    }
}
