//! Rate and duration units applied when rendering readings.

use std::time::Duration;

/// Unit rates are expressed in: events per `RateUnit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateUnit {
    #[default]
    Seconds,
    Minutes,
    Hours,
}

impl RateUnit {
    /// Convert an events-per-second rate into this unit.
    pub fn scale(self, per_second: f64) -> f64 {
        per_second * self.seconds() as f64
    }

    fn seconds(self) -> u64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
            Self::Hours => 3600,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Seconds => "second",
            Self::Minutes => "minute",
            Self::Hours => "hour",
        }
    }
}

/// Unit durations are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurationUnit {
    Nanoseconds,
    Microseconds,
    #[default]
    Milliseconds,
    Seconds,
}

impl DurationUnit {
    pub fn convert(self, d: Duration) -> f64 {
        d.as_nanos() as f64 / self.nanos() as f64
    }

    fn nanos(self) -> u64 {
        match self {
            Self::Nanoseconds => 1,
            Self::Microseconds => 1_000,
            Self::Milliseconds => 1_000_000,
            Self::Seconds => 1_000_000_000,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Nanoseconds => "nanoseconds",
            Self::Microseconds => "microseconds",
            Self::Milliseconds => "milliseconds",
            Self::Seconds => "seconds",
        }
    }
}

/// The pair of conversions a reporter renders with.
///
/// Defaults to rates per second and durations in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Units {
    pub rate: RateUnit,
    pub duration: DurationUnit,
}
