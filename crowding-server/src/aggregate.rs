//! Station-level aggregation of per-line readings.
//!
//! An interchange station is reported by its worst line: the highest known
//! crowding level, any delay, the shortest headway and the soonest next
//! train, stamped with the latest contributing timestamp.

use std::collections::HashSet;

use crate::domain::{FlowReading, LineCode, StationCode};
use crate::resolver::min_of;

/// Errors from aggregation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    /// No readings exist for the station
    #[error("no flow data found for station {0}")]
    NotFound(StationCode),
}

/// Keep the first reading of each line, in input order.
///
/// With input sorted newest first this is the latest reading per line.
/// Readings without a line code form a group of their own.
pub fn latest_per_line(readings: &[FlowReading]) -> Vec<&FlowReading> {
    let mut seen: HashSet<Option<LineCode>> = HashSet::new();
    readings
        .iter()
        .filter(|r| seen.insert(r.line_code))
        .collect()
}

/// Combine the latest reading of every line at `station` into one.
///
/// `readings` should be the station's most recent readings, newest first;
/// readings for other stations are ignored. The first contributing reading
/// in input order is the base for every field not combined below:
///
/// - `crowding_level`: highest known level (unavailable levels are ignored)
/// - `train_frequency`: shortest reported headway
/// - `next_train_minutes`: soonest reported next train
/// - `is_delay`: true if any line reports a delay
/// - `timestamp`: latest contributing timestamp
pub fn aggregate(
    station: StationCode,
    readings: &[FlowReading],
) -> Result<FlowReading, AggregateError> {
    let for_station: Vec<FlowReading> = readings
        .iter()
        .filter(|r| r.station_code == station)
        .cloned()
        .collect();

    let lines = latest_per_line(&for_station);
    let Some(&base) = lines.first() else {
        return Err(AggregateError::NotFound(station));
    };

    let mut aggregated = base.clone();

    if let Some(level) = lines
        .iter()
        .map(|r| r.crowding_level)
        .filter(|l| l.is_known())
        .max()
    {
        aggregated.crowding_level = level;
    }

    if let Some(freq) = min_of(lines.iter().filter_map(|r| r.train_frequency)) {
        aggregated.train_frequency = Some(freq);
    }

    if let Some(next) = min_of(lines.iter().filter_map(|r| r.next_train_minutes)) {
        aggregated.next_train_minutes = Some(next);
    }

    aggregated.is_delay = lines.iter().any(|r| r.is_delay);

    if let Some(latest) = lines.iter().map(|r| r.timestamp).max() {
        aggregated.timestamp = latest;
    }

    Ok(aggregated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CrowdingLevel;
    use chrono::{NaiveDate, NaiveDateTime};

    fn station() -> StationCode {
        StationCode::parse("ADM").unwrap()
    }

    fn ts(min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(8, min, 0)
            .unwrap()
    }

    fn reading(
        line: Option<&str>,
        level: CrowdingLevel,
        freq: Option<f64>,
        delay: bool,
        minute: u32,
    ) -> FlowReading {
        FlowReading {
            station_code: station(),
            line_code: line.map(|l| LineCode::parse(l).unwrap()),
            timestamp: ts(minute),
            crowding_level: level,
            train_frequency: freq,
            next_train_minutes: freq.map(|f| f / 2.0),
            is_delay: delay,
        }
    }

    #[test]
    fn worst_case_across_lines() {
        let readings = [
            reading(Some("TWL"), CrowdingLevel::Low, Some(5.0), false, 1),
            reading(Some("ISL"), CrowdingLevel::High, Some(3.0), true, 2),
        ];

        let agg = aggregate(station(), &readings).unwrap();

        assert_eq!(agg.crowding_level, CrowdingLevel::High);
        assert_eq!(agg.train_frequency, Some(3.0));
        assert_eq!(agg.next_train_minutes, Some(1.5));
        assert!(agg.is_delay);
        assert_eq!(agg.timestamp, ts(2));
        // Base fields come from the first contributing reading.
        assert_eq!(agg.line_code, Some(LineCode::parse("TWL").unwrap()));
    }

    #[test]
    fn empty_is_not_found() {
        assert_eq!(
            aggregate(station(), &[]),
            Err(AggregateError::NotFound(station()))
        );
    }

    #[test]
    fn other_stations_do_not_count() {
        let mut other = reading(Some("ISL"), CrowdingLevel::High, Some(2.0), true, 5);
        other.station_code = StationCode::parse("CEN").unwrap();

        assert!(aggregate(station(), &[other]).is_err());
    }

    #[test]
    fn only_latest_reading_per_line_counts() {
        let readings = [
            reading(Some("ISL"), CrowdingLevel::Low, Some(6.0), false, 10),
            reading(Some("ISL"), CrowdingLevel::High, Some(2.0), true, 5),
            reading(Some("EAL"), CrowdingLevel::Medium, Some(4.0), false, 9),
        ];

        let agg = aggregate(station(), &readings).unwrap();

        assert_eq!(agg.crowding_level, CrowdingLevel::Medium);
        assert_eq!(agg.train_frequency, Some(4.0));
        assert!(!agg.is_delay);
        assert_eq!(agg.timestamp, ts(10));
    }

    #[test]
    fn readings_without_line_form_one_group() {
        let readings = [
            reading(None, CrowdingLevel::Low, None, false, 3),
            reading(None, CrowdingLevel::High, None, true, 2),
        ];
        let lines = latest_per_line(&readings);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].crowding_level, CrowdingLevel::Low);
    }

    #[test]
    fn unavailable_levels_are_ignored() {
        let readings = [
            reading(Some("ISL"), CrowdingLevel::Unavailable, Some(2.0), false, 3),
            reading(Some("SIL"), CrowdingLevel::Low, Some(8.0), false, 2),
        ];
        let agg = aggregate(station(), &readings).unwrap();
        assert_eq!(agg.crowding_level, CrowdingLevel::Low);
        assert_eq!(agg.train_frequency, Some(2.0));
    }

    #[test]
    fn all_unavailable_keeps_base_level() {
        let readings = [reading(Some("ISL"), CrowdingLevel::Unavailable, None, false, 3)];
        let agg = aggregate(station(), &readings).unwrap();
        assert_eq!(agg.crowding_level, CrowdingLevel::Unavailable);
        assert_eq!(agg.train_frequency, None);
        assert_eq!(agg.next_train_minutes, None);
    }
}
