//! Crowding levels and the context they are classified in.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Discrete crowding level of a station or line.
///
/// Known levels are totally ordered `Low < Medium < High`. `Unavailable`
/// marks a reading whose level could not be computed; it sorts below every
/// known level and is ignored when combining readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrowdingLevel {
    Unavailable,
    Low,
    Medium,
    High,
}

impl CrowdingLevel {
    /// Whether this is one of the computed levels.
    pub fn is_known(self) -> bool {
        self != CrowdingLevel::Unavailable
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CrowdingLevel::Unavailable => "unavailable",
            CrowdingLevel::Low => "low",
            CrowdingLevel::Medium => "medium",
            CrowdingLevel::High => "high",
        }
    }
}

impl fmt::Display for CrowdingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contextual signals at classification time.
///
/// Built fresh for every classification from the current holiday and weather
/// state. Missing signals default to `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CrowdingContext {
    /// Hour of day in network local time, 0-23.
    pub hour: u32,
    pub is_holiday: bool,
    pub is_rainy: bool,
    pub is_delay: bool,
}

impl CrowdingContext {
    /// Context for the given hour with every flag cleared.
    pub fn at_hour(hour: u32) -> Self {
        Self {
            hour,
            ..Self::default()
        }
    }

    pub fn with_holiday(mut self, is_holiday: bool) -> Self {
        self.is_holiday = is_holiday;
        self
    }

    pub fn with_rain(mut self, is_rainy: bool) -> Self {
        self.is_rainy = is_rainy;
        self
    }

    pub fn with_delay(mut self, is_delay: bool) -> Self {
        self.is_delay = is_delay;
        self
    }
}
