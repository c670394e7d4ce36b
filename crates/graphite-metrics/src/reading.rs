//! Point-in-time metric values handed to the reporter.

use std::time::Duration;

/// The current value of one metric.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// Monotonic count.
    Counter(u64),
    /// Instantaneous value.
    Gauge(f64),
    /// Event count plus mean rate in events per second.
    Meter { count: u64, mean_rate: f64 },
    /// Recorded durations.
    Timer {
        count: u64,
        mean: Duration,
        max: Duration,
    },
}

/// A named [`MetricValue`] as read from a [`MetricSource`](crate::MetricSource).
#[derive(Debug, Clone, PartialEq)]
pub struct MetricReading {
    pub name: String,
    pub value: MetricValue,
}

impl MetricReading {
    pub fn new(name: impl Into<String>, value: MetricValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}
