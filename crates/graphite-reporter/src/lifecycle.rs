//! Reporter lifecycle — the uninitialized → stopped ⇄ running state machine.
//!
//! Every transition runs under one mutex, so `init`, `start` and `stop` never
//! interleave. Nothing in here returns an error: build and start failures are
//! logged and leave the lifecycle initialized but inactive.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use graphite_core::{Properties, ReporterConfig, reporter_enabled};

use crate::factory::ReporterFactory;
use crate::scheduled::PushReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// `init` has not run yet. Only `init` does anything.
    Uninitialized,
    /// Configured, not pushing.
    Stopped,
    /// Pushing on a timer.
    Running,
}

/// The one reporter a lifecycle owns at a time.
///
/// `id` increases with every build so a rebuilt handle is distinguishable
/// from the one it replaced.
struct ReporterHandle {
    id: u64,
    reporter: Box<dyn PushReporter>,
}

struct Inner {
    state: LifecycleState,
    config: Option<ReporterConfig>,
    handle: Option<ReporterHandle>,
    builds: u64,
}

/// Serialized start/stop control over a periodic push reporter.
pub struct ReporterLifecycle<F> {
    factory: F,
    inner: Mutex<Inner>,
}

impl<F: ReporterFactory> ReporterLifecycle<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            inner: Mutex::new(Inner {
                state: LifecycleState::Uninitialized,
                config: None,
                handle: None,
                builds: 0,
            }),
        }
    }

    /// Capture configuration and build the reporter. Runs once; later calls
    /// are ignored.
    ///
    /// Starts immediately with the host polling interval when the enabled
    /// flag is set.
    pub fn init(&self, props: &Properties) {
        let mut inner = self.lock();
        if inner.state != LifecycleState::Uninitialized {
            debug!("graphite reporter already initialized, ignoring init");
            return;
        }

        let config = ReporterConfig::from_properties(props);
        info!(
            host = %config.host,
            port = config.port,
            prefix = %config.prefix,
            "initializing graphite reporter"
        );
        if config.exclude_regex.is_some() {
            debug!(pattern = ?config.exclude_regex, "metric exclusion pattern configured");
        }

        let handle = self.build(&mut inner, &config);
        inner.handle = handle;
        inner.config = Some(config);
        inner.state = LifecycleState::Stopped;

        if reporter_enabled(props) {
            let secs = inner
                .config
                .as_ref()
                .map_or(0, |c| c.polling_interval_secs);
            self.start_locked(&mut inner, secs);
            debug!("graphite reporter auto-start requested");
        }
    }

    /// Start pushing every `interval_secs` seconds.
    ///
    /// Ignored unless the lifecycle is stopped with a reporter available.
    pub fn start(&self, interval_secs: u64) {
        let mut inner = self.lock();
        self.start_locked(&mut inner, interval_secs);
    }

    /// Stop pushing and build a fresh reporter for the next `start`.
    ///
    /// Ignored unless running.
    pub fn stop(&self) {
        let mut inner = self.lock();
        if inner.state != LifecycleState::Running {
            debug!(state = ?inner.state, "graphite reporter not running, ignoring stop");
            return;
        }

        if let Some(mut handle) = inner.handle.take() {
            handle.reporter.stop();
        }
        inner.state = LifecycleState::Stopped;
        info!("stopped graphite metrics reporter");

        // A stopped reporter cannot be restarted; prepare the next one now.
        if let Some(config) = inner.config.clone() {
            let handle = self.build(&mut inner, &config);
            inner.handle = handle;
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.lock().state
    }

    pub fn config(&self) -> Option<ReporterConfig> {
        self.lock().config.clone()
    }

    /// Generation id of the current reporter, if one is built.
    pub fn handle_id(&self) -> Option<u64> {
        self.lock().handle.as_ref().map(|h| h.id)
    }

    /// Period of the active push schedule, if running.
    pub fn running_period(&self) -> Option<Duration> {
        let inner = self.lock();
        match inner.state {
            LifecycleState::Running => inner.handle.as_ref().and_then(|h| h.reporter.period()),
            _ => None,
        }
    }

    fn start_locked(&self, inner: &mut Inner, interval_secs: u64) {
        match inner.state {
            LifecycleState::Uninitialized => {
                debug!("graphite reporter not initialized, ignoring start");
                return;
            }
            LifecycleState::Running => {
                debug!("graphite reporter already running, ignoring start");
                return;
            }
            LifecycleState::Stopped => {}
        }

        if interval_secs == 0 {
            warn!("polling interval must be positive, ignoring start");
            return;
        }
        let Some(handle) = inner.handle.as_mut() else {
            warn!("no graphite reporter available, ignoring start");
            return;
        };

        match handle.reporter.start(Duration::from_secs(interval_secs)) {
            Ok(()) => {
                inner.state = LifecycleState::Running;
                info!(
                    polling_period_secs = interval_secs,
                    "started graphite metrics reporter"
                );
            }
            Err(e) => error!(error = %e, "unable to start graphite reporter"),
        }
    }

    fn build(&self, inner: &mut Inner, config: &ReporterConfig) -> Option<ReporterHandle> {
        match self.factory.build(config) {
            Ok(reporter) => {
                inner.builds += 1;
                Some(ReporterHandle {
                    id: inner.builds,
                    reporter,
                })
            }
            Err(e) => {
                error!(endpoint = %config.endpoint(), error = %e, "unable to initialize graphite reporter");
                None
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use graphite_core::config::{ENABLED_KEY, HOST_KEY, POLLING_INTERVAL_KEY, PREFIX_KEY};

    use super::*;
    use crate::error::{ReporterError, ReporterResult};

    /// Counts builds and active timers across every reporter it creates.
    #[derive(Clone, Default)]
    struct MockFactory {
        builds: Arc<AtomicUsize>,
        active: Arc<AtomicUsize>,
        fail: Arc<AtomicBool>,
    }

    struct MockReporter {
        active: Arc<AtomicUsize>,
        prefix: String,
        period: Option<Duration>,
        stopped: bool,
    }

    impl PushReporter for MockReporter {
        fn start(&mut self, period: Duration) -> ReporterResult<()> {
            if self.stopped {
                return Err(ReporterError::Terminated);
            }
            if self.period.is_some() {
                return Err(ReporterError::AlreadyStarted);
            }
            self.active.fetch_add(1, Ordering::SeqCst);
            self.period = Some(period);
            Ok(())
        }

        fn stop(&mut self) {
            if self.period.take().is_some() {
                self.active.fetch_sub(1, Ordering::SeqCst);
            }
            self.stopped = true;
        }

        fn is_running(&self) -> bool {
            self.period.is_some()
        }

        fn period(&self) -> Option<Duration> {
            self.period
        }

        fn prefix(&self) -> &str {
            &self.prefix
        }
    }

    impl ReporterFactory for MockFactory {
        fn build(&self, config: &ReporterConfig) -> ReporterResult<Box<dyn PushReporter>> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ReporterError::InvalidHost(config.host.clone()));
            }
            self.builds.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MockReporter {
                active: self.active.clone(),
                prefix: config.prefix.clone(),
                period: None,
                stopped: false,
            }))
        }
    }

    fn lifecycle() -> (ReporterLifecycle<MockFactory>, MockFactory) {
        let factory = MockFactory::default();
        (ReporterLifecycle::new(factory.clone()), factory)
    }

    fn enabled(interval: &str) -> Properties {
        Properties::from_pairs([(ENABLED_KEY, "true"), (POLLING_INTERVAL_KEY, interval)])
    }

    #[test]
    fn start_and_stop_before_init_do_nothing() {
        let (lc, factory) = lifecycle();
        lc.start(10);
        lc.stop();
        lc.start(5);

        assert_eq!(lc.state(), LifecycleState::Uninitialized);
        assert_eq!(factory.builds.load(Ordering::SeqCst), 0);
        assert_eq!(lc.handle_id(), None);
        assert_eq!(lc.config(), None);
    }

    #[test]
    fn init_without_enabled_flag_stays_stopped() {
        let (lc, factory) = lifecycle();
        lc.init(&Properties::new());

        assert_eq!(lc.state(), LifecycleState::Stopped);
        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
        assert_eq!(lc.handle_id(), Some(1));
        assert_eq!(lc.config(), Some(ReporterConfig::default()));
        assert_eq!(lc.running_period(), None);
    }

    #[test]
    fn second_init_is_ignored() {
        let (lc, factory) = lifecycle();
        lc.init(&Properties::from_pairs([(HOST_KEY, "first.example")]));
        let first_id = lc.handle_id();

        lc.init(&Properties::from_pairs([(HOST_KEY, "second.example")]));

        assert_eq!(lc.config().unwrap().host, "first.example");
        assert_eq!(lc.handle_id(), first_id);
        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn enabled_init_starts_with_polling_interval() {
        let (lc, factory) = lifecycle();
        lc.init(&enabled("10"));

        assert_eq!(lc.state(), LifecycleState::Running);
        assert_eq!(lc.running_period(), Some(Duration::from_secs(10)));
        assert_eq!(factory.active.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn uppercase_enabled_flag_starts_reporter() {
        let (lc, _factory) = lifecycle();
        lc.init(&Properties::from_pairs([
            (ENABLED_KEY, "TRUE"),
            (POLLING_INTERVAL_KEY, "10"),
        ]));

        assert_eq!(lc.state(), LifecycleState::Running);
        assert_eq!(lc.running_period(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn start_while_running_keeps_one_timer() {
        let (lc, factory) = lifecycle();
        lc.init(&enabled("10"));
        lc.start(10);
        lc.start(30);

        assert_eq!(factory.active.load(Ordering::SeqCst), 1);
        assert_eq!(lc.running_period(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn stop_while_stopped_does_not_rebuild() {
        let (lc, factory) = lifecycle();
        lc.init(&Properties::new());
        let id = lc.handle_id();

        lc.stop();

        assert_eq!(lc.state(), LifecycleState::Stopped);
        assert_eq!(lc.handle_id(), id);
        assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn stop_rebuilds_a_distinct_handle() {
        let (lc, factory) = lifecycle();
        lc.init(&enabled("10"));
        let before = lc.handle_id().unwrap();

        lc.stop();

        let after = lc.handle_id().unwrap();
        assert_ne!(before, after);
        assert_eq!(lc.state(), LifecycleState::Stopped);
        assert_eq!(factory.active.load(Ordering::SeqCst), 0);
        assert_eq!(factory.builds.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn restart_after_stop_uses_new_handle() {
        let (lc, factory) = lifecycle();
        lc.init(&enabled("10"));
        lc.stop();
        lc.start(20);

        assert_eq!(lc.state(), LifecycleState::Running);
        assert_eq!(lc.running_period(), Some(Duration::from_secs(20)));
        assert_eq!(factory.active.load(Ordering::SeqCst), 1);

        for _ in 0..3 {
            lc.stop();
            lc.start(5);
        }
        assert_eq!(factory.active.load(Ordering::SeqCst), 1);
        assert_eq!(factory.builds.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn build_failure_at_init_degrades_to_stopped() {
        let (lc, factory) = lifecycle();
        factory.fail.store(true, Ordering::SeqCst);

        lc.init(&enabled("10"));

        assert_eq!(lc.state(), LifecycleState::Stopped);
        assert_eq!(lc.handle_id(), None);

        // Start without a handle is a no-op even once builds would succeed.
        factory.fail.store(false, Ordering::SeqCst);
        lc.start(10);
        assert_eq!(lc.state(), LifecycleState::Stopped);
        assert_eq!(factory.active.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn rebuild_failure_after_stop_leaves_no_handle() {
        let (lc, factory) = lifecycle();
        lc.init(&enabled("10"));
        factory.fail.store(true, Ordering::SeqCst);

        lc.stop();

        assert_eq!(lc.state(), LifecycleState::Stopped);
        assert_eq!(lc.handle_id(), None);
        lc.start(10);
        assert_eq!(lc.state(), LifecycleState::Stopped);
    }

    #[test]
    fn zero_interval_start_is_ignored() {
        let (lc, factory) = lifecycle();
        lc.init(&Properties::new());
        lc.start(0);

        assert_eq!(lc.state(), LifecycleState::Stopped);
        assert_eq!(factory.active.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn prefix_reaches_reporter_unchanged() {
        let (lc, _factory) = lifecycle();
        lc.init(&Properties::from_pairs([(PREFIX_KEY, "kafka")]));

        let inner = lc.lock();
        let handle = inner.handle.as_ref().unwrap();
        assert_eq!(handle.reporter.prefix(), "kafka");
    }

    #[test]
    fn concurrent_starts_create_one_timer() {
        let (lc, factory) = lifecycle();
        lc.init(&Properties::new());
        let lc = Arc::new(lc);

        let threads: Vec<_> = (0..8)
            .map(|_| {
                let lc = lc.clone();
                std::thread::spawn(move || lc.start(10))
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(lc.state(), LifecycleState::Running);
        assert_eq!(factory.active.load(Ordering::SeqCst), 1);
    }
}
