//! Train arrival records.

use serde::Serialize;

/// One upcoming train arrival for a direction of a line at a station.
///
/// Produced fresh from every schedule poll. Numeric fields are `None` when the
/// feed sent something that could not be read as a number; such records are
/// still displayed but never used for headway estimation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrivalRecord {
    /// 1-based position among the currently known arrivals (1 = next train).
    pub sequence: Option<u32>,

    /// Minutes until this train reaches the platform.
    pub ttnt: Option<f64>,

    /// Whether the feed marks this arrival as valid.
    pub valid: bool,

    /// Platform number.
    pub platform: String,

    /// Destination station code as sent by the feed.
    pub destination: String,

    /// Scheduled clock time, `YYYY-MM-DD HH:MM:SS`.
    pub time: String,
}

impl ArrivalRecord {
    /// Whether the record can contribute to a headway estimate.
    pub fn is_sequenced(&self) -> bool {
        self.valid && self.sequence.is_some() && self.ttnt.is_some_and(f64::is_finite)
    }
}
