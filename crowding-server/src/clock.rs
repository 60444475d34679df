//! Time source abstraction.
//!
//! Caches and classification read the time through a [`Clock`] so tests can
//! drive them with a [`ManualClock`].

use std::sync::Mutex;

use chrono::{FixedOffset, NaiveDateTime, Offset, Utc};

/// Hong Kong time (UTC+8).
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 8;

/// Source of the current network local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock shifted to a fixed UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Create a clock for the given UTC offset in hours.
    ///
    /// Offsets outside ±23 hours fall back to UTC.
    pub fn with_offset_hours(hours: i32) -> Self {
        let offset = hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or(Utc.fix());
        Self { offset }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::with_offset_hours(DEFAULT_UTC_OFFSET_HOURS)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.offset).naive_local()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn manual_clock_moves_on_request() {
        let clock = ManualClock::new(at(10, 0, 0));
        assert_eq!(clock.now(), at(10, 0, 0));

        clock.advance(Duration::seconds(45));
        assert_eq!(clock.now(), at(10, 0, 45));

        clock.set(at(18, 30, 0));
        assert_eq!(clock.now(), at(18, 30, 0));
    }

    #[test]
    fn system_clock_applies_offset() {
        let utc = SystemClock::with_offset_hours(0).now();
        let hkt = SystemClock::with_offset_hours(8).now();
        let diff = hkt - utc;
        assert!((diff - Duration::hours(8)).num_seconds().abs() < 5);
    }
}
