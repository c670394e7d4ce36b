//! Process-level metrics published by the host into the registry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, info};

use graphite_metrics::Registry;

pub const UPTIME_GAUGE: &str = "process.uptime_seconds";
pub const PARALLELISM_GAUGE: &str = "process.available_parallelism";
pub const SAMPLES_COUNTER: &str = "process.samples";

/// Refresh one round of process gauges.
pub fn sample(registry: &Registry, started: Instant) {
    registry
        .gauge(UPTIME_GAUGE)
        .set(started.elapsed().as_secs_f64());
    let parallelism = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    registry.gauge(PARALLELISM_GAUGE).set(parallelism as f64);
    registry.counter(SAMPLES_COUNTER).inc();
}

/// Sample process metrics every `interval` until shutdown.
pub async fn run(registry: Arc<Registry>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    let started = Instant::now();
    info!(interval_secs = interval.as_secs(), "process metrics sampler started");

    loop {
        sample(&registry, started);
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.changed() => {
                debug!("process metrics sampler shutting down");
                break;
            }
        }
    }
}
