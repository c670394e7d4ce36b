//! Builds push reporters from a [`ReporterConfig`].

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::debug;

use graphite_core::ReporterConfig;
use graphite_metrics::{DurationUnit, MetricFilter, MetricSource, RateUnit};

use crate::error::{ReporterError, ReporterResult};
use crate::scheduled::{PushReporter, ScheduledReporter};
use crate::target::GraphiteTarget;

/// Constructs a fresh, not-yet-started reporter.
///
/// Implementations must not perform network I/O; building only validates and
/// wires objects together.
pub trait ReporterFactory: Send + Sync {
    fn build(&self, config: &ReporterConfig) -> ReporterResult<Box<dyn PushReporter>>;
}

/// Builds Graphite reporters bound to one metric source.
///
/// Rates are reported per second and durations in milliseconds.
pub struct GraphiteReporterFactory {
    source: Arc<dyn MetricSource>,
    runtime: Handle,
    connect_timeout: Duration,
}

impl GraphiteReporterFactory {
    pub fn new(source: Arc<dyn MetricSource>, runtime: Handle) -> Self {
        Self {
            source,
            runtime,
            connect_timeout: Duration::from_secs(5),
        }
    }

    /// Bind to the tokio runtime the caller is running on.
    pub fn on_current_runtime(source: Arc<dyn MetricSource>) -> ReporterResult<Self> {
        let runtime = Handle::try_current().map_err(|_| ReporterError::NoRuntime)?;
        Ok(Self::new(source, runtime))
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl ReporterFactory for GraphiteReporterFactory {
    fn build(&self, config: &ReporterConfig) -> ReporterResult<Box<dyn PushReporter>> {
        let target = GraphiteTarget::new(&config.host, config.port)?
            .with_connect_timeout(self.connect_timeout);
        let filter = MetricFilter::from_pattern(config.exclude_regex.as_deref());
        let (rate, duration) = (RateUnit::Seconds, DurationUnit::Milliseconds);

        debug!(
            endpoint = %target.endpoint(),
            prefix = %config.prefix,
            filtering = filter.is_filtering(),
            rate_unit = rate.name(),
            duration_unit = duration.name(),
            "building graphite reporter"
        );

        let reporter = ScheduledReporter::builder(self.source.clone())
            .prefixed_with(config.prefix.clone())
            .convert_rates_to(rate)
            .convert_durations_to(duration)
            .filter(filter)
            .build(Arc::new(target), self.runtime.clone());

        Ok(Box::new(reporter))
    }
}

#[cfg(test)]
mod tests {
    use graphite_metrics::Registry;

    use super::*;

    fn config(host: &str, prefix: &str) -> ReporterConfig {
        ReporterConfig {
            host: host.to_string(),
            prefix: prefix.to_string(),
            ..ReporterConfig::default()
        }
    }

    #[tokio::test]
    async fn builds_unstarted_reporter_with_prefix() {
        let factory = GraphiteReporterFactory::on_current_runtime(Arc::new(Registry::new())).unwrap();
        let reporter = factory.build(&config("localhost", "kafka")).unwrap();

        assert_eq!(reporter.prefix(), "kafka");
        assert!(!reporter.is_running());
    }

    #[tokio::test]
    async fn invalid_host_fails_to_build() {
        let factory = GraphiteReporterFactory::on_current_runtime(Arc::new(Registry::new())).unwrap();
        let err = factory.build(&config("bad..host", "kafka")).err().unwrap();
        assert!(matches!(err, ReporterError::InvalidHost(_)));
    }

    #[tokio::test]
    async fn invalid_exclusion_pattern_still_builds() {
        let factory = GraphiteReporterFactory::on_current_runtime(Arc::new(Registry::new())).unwrap();
        let cfg = ReporterConfig {
            exclude_regex: Some("(".to_string()),
            ..ReporterConfig::default()
        };
        assert!(factory.build(&cfg).is_ok());
    }

    #[test]
    fn no_runtime_outside_tokio() {
        let result = GraphiteReporterFactory::on_current_runtime(Arc::new(Registry::new()));
        assert!(matches!(result, Err(ReporterError::NoRuntime)));
    }
}
