//! Graphite plaintext rendering.
//!
//! Renders readings into `<path> <value> <epoch>` lines, one per value.
//! Counters render as integers, everything else with two decimals.

use std::fmt::Write as _;

use crate::filter::MetricFilter;
use crate::reading::{MetricReading, MetricValue};
use crate::units::Units;

/// Render readings accepted by `filter` into Graphite plaintext lines.
///
/// Every path is `<prefix>.<name>.<field>`; an empty prefix is omitted.
/// Whitespace anywhere in the path becomes `-`. Non-finite floats are skipped.
pub fn render_plaintext(
    prefix: &str,
    readings: &[MetricReading],
    filter: &MetricFilter,
    units: Units,
    epoch: u64,
) -> String {
    let mut out = String::new();

    for reading in readings.iter().filter(|r| filter.accepts(&r.name)) {
        let base = metric_path(prefix, &reading.name);
        match &reading.value {
            MetricValue::Counter(count) => {
                push_int(&mut out, &base, "count", *count, epoch);
            }
            MetricValue::Gauge(value) => {
                push_float(&mut out, &base, "value", *value, epoch);
            }
            MetricValue::Meter { count, mean_rate } => {
                push_int(&mut out, &base, "count", *count, epoch);
                push_float(&mut out, &base, "mean_rate", units.rate.scale(*mean_rate), epoch);
            }
            MetricValue::Timer { count, mean, max } => {
                push_int(&mut out, &base, "count", *count, epoch);
                push_float(&mut out, &base, "mean", units.duration.convert(*mean), epoch);
                push_float(&mut out, &base, "max", units.duration.convert(*max), epoch);
            }
        }
    }

    out
}

fn metric_path(prefix: &str, name: &str) -> String {
    let path = if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    };
    // A space would split the line into extra fields.
    path.chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect()
}

fn push_int(out: &mut String, base: &str, field: &str, value: u64, epoch: u64) {
    let _ = writeln!(out, "{base}.{field} {value} {epoch}");
}

fn push_float(out: &mut String, base: &str, field: &str, value: f64, epoch: u64) {
    if value.is_finite() {
        let _ = writeln!(out, "{base}.{field} {value:.2} {epoch}");
    }
}
