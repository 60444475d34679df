//! Headway estimation from upcoming arrivals.
//!
//! The gap between the 2nd and 3rd upcoming trains is preferred because by
//! then the train already approaching the platform no longer distorts the
//! reading. The 1st/2nd gap is the fallback.

use std::collections::HashMap;

use crate::domain::ArrivalRecord;

/// Estimate the headway in minutes for one direction of one line.
///
/// Only valid records with a sequence number and a numeric time-to-next-train
/// are considered; when several records share a sequence number the last one
/// wins. Returns `None` when neither the 2/3 nor the 1/2 pair is available,
/// meaning there is not enough data. Callers must not treat that as zero.
pub fn estimate_headway(arrivals: &[ArrivalRecord]) -> Option<f64> {
    let by_sequence: HashMap<u32, f64> = arrivals
        .iter()
        .filter(|a| a.is_sequenced())
        .filter_map(|a| Some((a.sequence?, a.ttnt?)))
        .collect();

    let gap = |earlier: u32, later: u32| {
        let a = by_sequence.get(&earlier)?;
        let b = by_sequence.get(&later)?;
        Some((b - a).abs())
    };

    gap(2, 3).or_else(|| gap(1, 2))
}
