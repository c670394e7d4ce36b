//! The boundary a host metrics framework drives.

use std::sync::Arc;

use tokio::runtime::Handle;

use graphite_core::Properties;
use graphite_metrics::MetricSource;

use crate::factory::{GraphiteReporterFactory, ReporterFactory};
use crate::lifecycle::ReporterLifecycle;

/// Management name under which the reporter registers with the host.
pub const MANAGEMENT_NAME: &str = "kafka:type=kafka_graphite.GraphiteMetricsReporter";

/// What a host framework expects from a metrics reporter plugin.
///
/// None of these calls fail from the host's point of view; problems are
/// logged and the reporter goes quiet.
pub trait MetricsReporterPlugin: Send + Sync {
    fn init(&self, props: &Properties);

    fn start_reporter(&self, polling_period_secs: u64);

    fn stop_reporter(&self);

    fn management_name(&self) -> &str;
}

impl<F: ReporterFactory> MetricsReporterPlugin for ReporterLifecycle<F> {
    fn init(&self, props: &Properties) {
        ReporterLifecycle::init(self, props);
    }

    fn start_reporter(&self, polling_period_secs: u64) {
        self.start(polling_period_secs);
    }

    fn stop_reporter(&self) {
        self.stop();
    }

    fn management_name(&self) -> &str {
        MANAGEMENT_NAME
    }
}

/// The Graphite reporter plugin: a lifecycle over [`GraphiteReporterFactory`].
pub type GraphiteMetricsReporter = ReporterLifecycle<GraphiteReporterFactory>;

impl ReporterLifecycle<GraphiteReporterFactory> {
    /// Report `source` to Graphite, scheduling pushes on `runtime`.
    pub fn graphite(source: Arc<dyn MetricSource>, runtime: Handle) -> Self {
        Self::new(GraphiteReporterFactory::new(source, runtime))
    }
}
