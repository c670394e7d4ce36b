//! graphite-metrics — what the Graphite reporter reads and how it writes it.
//!
//! The registry is an external collaborator: anything implementing
//! [`MetricSource`] can be reported. [`Registry`] is a small in-memory
//! implementation for hosts that do not bring their own.
//!
//! # Architecture
//!
//! ```text
//! MetricSource (trait)
//!   └── snapshot() → Vec<MetricReading>
//!
//! MetricFilter
//!   └── accepts(name) ← drops excluded readings
//!
//! Plaintext rendering
//!   └── render_plaintext() → "<path> <value> <epoch>\n" lines
//! ```

pub mod filter;
pub mod plaintext;
pub mod reading;
pub mod registry;
pub mod units;

pub use filter::MetricFilter;
pub use plaintext::render_plaintext;
pub use reading::{MetricReading, MetricValue};
pub use registry::{Counter, Gauge, Meter, MetricSource, Registry, Timer};
pub use units::{DurationUnit, RateUnit, Units};
