//! graphite-reporter — periodic Graphite push with a host-driven lifecycle.
//!
//! # Architecture
//!
//! ```text
//! MetricsReporterPlugin (host boundary)
//!   └── ReporterLifecycle ── one mutex around every transition
//!         ├── init()  → ReporterFactory::build() → ScheduledReporter
//!         ├── start() → spawn report loop on tokio
//!         └── stop()  → signal loop, rebuild a fresh reporter
//!
//! ScheduledReporter
//!   └── every period: MetricSource::snapshot() → render → MetricSink::send()
//!
//! GraphiteTarget (MetricSink)
//!   └── plaintext lines over TCP
//! ```

pub mod error;
pub mod factory;
pub mod lifecycle;
pub mod plugin;
pub mod scheduled;
pub mod target;

pub use error::{ReporterError, ReporterResult};
pub use factory::{GraphiteReporterFactory, ReporterFactory};
pub use lifecycle::{LifecycleState, ReporterLifecycle};
pub use plugin::{GraphiteMetricsReporter, MANAGEMENT_NAME, MetricsReporterPlugin};
pub use scheduled::{PushReporter, ScheduledReporter, ScheduledReporterBuilder};
pub use target::{BoxFuture, GraphiteTarget, MetricSink};
