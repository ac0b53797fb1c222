use std::fmt;

use serde::Serialize;

const SECONDS_PER_HOUR: i64 = 3600;
const SECONDS_PER_MINUTE: i64 = 60;

/// Hours/minutes/seconds breakdown of a duration in seconds.
///
/// Negative durations carry their sign on `hours` only; `minutes` and
/// `seconds` are always non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Hhmmss {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Hhmmss {
    pub fn from_seconds(value: f64) -> Self {
        if !value.is_finite() {
            return Self::default();
        }

        let sign = if value < 0.0 { -1 } else { 1 };
        let total = value.abs().floor() as i64;

        Self {
            hours: (total / SECONDS_PER_HOUR) * sign,
            minutes: (total % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
            seconds: total % SECONDS_PER_MINUTE,
        }
    }
}

impl fmt::Display for Hhmmss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// Running view of the printer, built up from status deltas.
///
/// Each field holds the latest value observed for that field; a notification
/// that carries only some fields leaves the others as they were.
/// `time_remaining_seconds` is fed from `print_stats.print_duration`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrinterStatusSnapshot {
    pub layer: i64,
    pub total_layers: i64,
    pub time_remaining_seconds: f64,
    pub time_remaining: Hhmmss,
    pub progress: f64,
    pub filename: String,
    pub state: String,
}
