//! Crowding classification.
//!
//! Shorter headways mean more passengers are being moved and so more crowded
//! platforms. Thresholds depend on the time of day and the context:
//!
//! - Rush hour is 07:00-09:59 and 17:00-19:59, and never applies on public
//!   holidays.
//! - Rain relaxes every threshold by half a minute (the "umbrella effect").
//! - A reported delay forces `High` during rush hour and at least `Medium`
//!   otherwise.
//!
//! All comparisons are strict, so a value exactly on a threshold falls into
//! the less crowded bucket.

use std::ops::RangeInclusive;

use serde::Serialize;
use tracing::debug;

use crate::domain::{CrowdingContext, CrowdingLevel};

/// Hours treated as peak demand.
pub const RUSH_HOURS: [RangeInclusive<u32>; 2] = [7..=9, 17..=19];

/// Minutes added to every threshold when it is raining.
pub const RAIN_ADJUSTMENT_MINS: f64 = 0.5;

const RUSH_HIGH_BELOW_MINS: f64 = 2.5;
const RUSH_MEDIUM_BELOW_MINS: f64 = 4.0;
const OFF_PEAK_MEDIUM_BELOW_MINS: f64 = 3.0;

/// Whether the rush-hour thresholds apply.
pub fn is_rush_hour(hour: u32, is_holiday: bool) -> bool {
    !is_holiday && RUSH_HOURS.iter().any(|window| window.contains(&hour))
}

/// Classify a headway in minutes into a crowding level.
///
/// Pure and deterministic. The value is not validated; see [`assess`] for the
/// checked entry point.
pub fn classify(frequency: f64, ctx: &CrowdingContext) -> CrowdingLevel {
    let adj = if ctx.is_rainy {
        RAIN_ADJUSTMENT_MINS
    } else {
        0.0
    };

    if is_rush_hour(ctx.hour, ctx.is_holiday) {
        if ctx.is_delay {
            return CrowdingLevel::High;
        }
        if frequency < RUSH_HIGH_BELOW_MINS + adj {
            CrowdingLevel::High
        } else if frequency < RUSH_MEDIUM_BELOW_MINS + adj {
            CrowdingLevel::Medium
        } else {
            CrowdingLevel::Low
        }
    } else {
        if ctx.is_delay {
            return CrowdingLevel::Medium;
        }
        if frequency < OFF_PEAK_MEDIUM_BELOW_MINS + adj {
            CrowdingLevel::Medium
        } else {
            CrowdingLevel::Low
        }
    }
}

/// The quantity a crowding level is derived from.
///
/// The thresholds are calibrated for headways. Minutes-to-next-train is only a
/// proxy for when no headway could be estimated, and is kept distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "minutes", rename_all = "snake_case")]
pub enum CrowdingMetric {
    Headway(f64),
    NextTrainProxy(f64),
}

impl CrowdingMetric {
    /// Pick the metric for a reading: the headway when known, else the
    /// next-train proxy.
    pub fn choose(headway: Option<f64>, next_train_minutes: Option<f64>) -> Option<Self> {
        headway
            .map(CrowdingMetric::Headway)
            .or(next_train_minutes.map(CrowdingMetric::NextTrainProxy))
    }

    pub fn minutes(self) -> f64 {
        match self {
            CrowdingMetric::Headway(m) | CrowdingMetric::NextTrainProxy(m) => m,
        }
    }
}

/// Classify a metric, producing `Unavailable` when there is nothing usable.
///
/// Missing, non-finite and non-positive values cannot be classified.
pub fn assess(metric: Option<CrowdingMetric>, ctx: &CrowdingContext) -> CrowdingLevel {
    let Some(metric) = metric else {
        return CrowdingLevel::Unavailable;
    };

    let minutes = metric.minutes();
    if !minutes.is_finite() || minutes <= 0.0 {
        debug!(?metric, "metric cannot be classified");
        return CrowdingLevel::Unavailable;
    }

    let level = classify(minutes, ctx);
    debug!(?metric, ?ctx, %level, "classified crowding");
    level
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn rush_hour() -> impl Strategy<Value = u32> {
        prop_oneof![7u32..=9, 17u32..=19]
    }

    proptest! {
        /// Longer headways never make a station more crowded.
        #[test]
        fn monotone_in_frequency(
            a in 0.0f64..20.0,
            b in 0.0f64..20.0,
            hour in 0u32..24,
            rainy in any::<bool>(),
        ) {
            let (short, long) = if a <= b { (a, b) } else { (b, a) };
            let c = CrowdingContext::at_hour(hour).with_rain(rainy);
            prop_assert!(classify(long, &c) <= classify(short, &c));
        }

        /// A delay during rush hour is always high.
        #[test]
        fn rush_hour_delay_is_high(f in -5.0f64..60.0, hour in rush_hour(), rainy in any::<bool>()) {
            let c = CrowdingContext::at_hour(hour).with_rain(rainy).with_delay(true);
            prop_assert_eq!(classify(f, &c), CrowdingLevel::High);
        }

        /// Holidays behave exactly like an off-peak hour.
        #[test]
        fn holiday_matches_off_peak(f in 0.0f64..20.0, hour in rush_hour(), rainy in any::<bool>(), delay in any::<bool>()) {
            let holiday = CrowdingContext::at_hour(hour)
                .with_holiday(true)
                .with_rain(rainy)
                .with_delay(delay);
            let off_peak = CrowdingContext::at_hour(12).with_rain(rainy).with_delay(delay);
            prop_assert_eq!(classify(f, &holiday), classify(f, &off_peak));
            prop_assert_ne!(classify(f, &holiday), CrowdingLevel::High);
        }

        /// Classification never yields the unavailable marker.
        #[test]
        fn classify_always_known(f in any::<f64>(), hour in 0u32..24) {
            prop_assert!(classify(f, &CrowdingContext::at_hour(hour)).is_known());
        }
    }
}
