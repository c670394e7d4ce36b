//! Scheduled push reporter — reads a metric source on a timer and pushes the
//! rendered report to a sink.
//!
//! Each started reporter owns one background task. Stopping signals the task
//! over a `watch` channel; the task flushes one last report and exits. A
//! stopped reporter is spent: build a new one to report again.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use graphite_metrics::{
    DurationUnit, MetricFilter, MetricSource, RateUnit, Units, render_plaintext,
};

use crate::error::{ReporterError, ReporterResult};
use crate::target::MetricSink;

/// A reporter that can be started once on a fixed period and stopped.
pub trait PushReporter: Send {
    /// Begin pushing every `period`. The first push happens one period from now.
    fn start(&mut self, period: Duration) -> ReporterResult<()>;

    /// Stop pushing. Idempotent.
    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Period of the active schedule, if running.
    fn period(&self) -> Option<Duration>;

    /// Prefix prepended to every metric path.
    fn prefix(&self) -> &str;
}

/// What a single push needs, shared with the background task.
struct ReportContext {
    source: Arc<dyn MetricSource>,
    sink: Arc<dyn MetricSink>,
    prefix: String,
    filter: MetricFilter,
    units: Units,
}

impl ReportContext {
    /// Render the current readings and hand them to the sink.
    ///
    /// Returns the number of lines pushed.
    async fn report(&self) -> ReporterResult<usize> {
        let readings = self.source.snapshot();
        let payload = render_plaintext(&self.prefix, &readings, &self.filter, self.units, epoch_secs());
        let lines = payload.lines().count();
        self.sink.send(&payload).await?;
        Ok(lines)
    }
}

/// Handle to the running report loop.
struct RunningTask {
    handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
    period: Duration,
}

/// Builder for [`ScheduledReporter`], bound to a metric source.
pub struct ScheduledReporterBuilder {
    source: Arc<dyn MetricSource>,
    prefix: String,
    filter: MetricFilter,
    units: Units,
}

impl ScheduledReporterBuilder {
    pub fn prefixed_with(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn convert_rates_to(mut self, unit: RateUnit) -> Self {
        self.units.rate = unit;
        self
    }

    pub fn convert_durations_to(mut self, unit: DurationUnit) -> Self {
        self.units.duration = unit;
        self
    }

    pub fn filter(mut self, filter: MetricFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Finish the reporter. Reports are scheduled on `runtime` once started.
    pub fn build(self, sink: Arc<dyn MetricSink>, runtime: Handle) -> ScheduledReporter {
        ScheduledReporter {
            ctx: Arc::new(ReportContext {
                source: self.source,
                sink,
                prefix: self.prefix,
                filter: self.filter,
                units: self.units,
            }),
            runtime,
            task: None,
            terminated: false,
        }
    }
}

/// Periodically pushes every reading of a [`MetricSource`] to a [`MetricSink`].
pub struct ScheduledReporter {
    ctx: Arc<ReportContext>,
    runtime: Handle,
    task: Option<RunningTask>,
    terminated: bool,
}

impl ScheduledReporter {
    pub fn builder(source: Arc<dyn MetricSource>) -> ScheduledReporterBuilder {
        ScheduledReporterBuilder {
            source,
            prefix: String::new(),
            filter: MetricFilter::all(),
            units: Units::default(),
        }
    }

    /// Push one report now, outside the schedule.
    pub async fn report_once(&self) -> ReporterResult<usize> {
        self.ctx.report().await
    }

    pub fn units(&self) -> Units {
        self.ctx.units
    }

    pub fn destination(&self) -> String {
        self.ctx.sink.describe()
    }
}

impl PushReporter for ScheduledReporter {
    fn start(&mut self, period: Duration) -> ReporterResult<()> {
        if self.terminated {
            return Err(ReporterError::Terminated);
        }
        if self.task.is_some() {
            return Err(ReporterError::AlreadyStarted);
        }
        if period.is_zero() {
            return Err(ReporterError::InvalidPeriod);
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let ctx = self.ctx.clone();
        let handle = self
            .runtime
            .spawn(async move { run_report_loop(ctx, period, shutdown_rx).await });

        self.task = Some(RunningTask {
            handle,
            shutdown_tx,
            period,
        });
        info!(
            destination = %self.destination(),
            period_secs = period.as_secs(),
            "scheduled reporter started"
        );
        Ok(())
    }

    fn stop(&mut self) {
        self.terminated = true;
        if let Some(task) = self.task.take() {
            let _ = task.shutdown_tx.send(true);
            info!(destination = %self.destination(), "scheduled reporter stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.task
            .as_ref()
            .is_some_and(|t| !t.handle.is_finished())
    }

    fn period(&self) -> Option<Duration> {
        self.task.as_ref().map(|t| t.period)
    }

    fn prefix(&self) -> &str {
        &self.ctx.prefix
    }
}

impl Drop for ScheduledReporter {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.shutdown_tx.send(true);
        }
    }
}

async fn run_report_loop(
    ctx: Arc<ReportContext>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match ctx.report().await {
                    Ok(lines) => debug!(lines, "metrics pushed"),
                    Err(e) => warn!(destination = %ctx.sink.describe(), error = %e, "unable to report to graphite"),
                }
            }
            _ = shutdown.changed() => {
                // Final flush so the last partial window is not lost.
                if let Err(e) = ctx.report().await {
                    warn!(destination = %ctx.sink.describe(), error = %e, "final report failed");
                }
                break;
            }
        }
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
