//! Metric registry contract and a small in-memory implementation.
//!
//! Counters, gauges and meters are lock-free atomics. Timers keep their
//! aggregate behind a mutex since they update several fields at once.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::reading::{MetricReading, MetricValue};

/// Anything the reporter can read metric values from.
pub trait MetricSource: Send + Sync {
    /// Current value of every metric, in a stable order.
    fn snapshot(&self) -> Vec<MetricReading>;
}

/// Monotonic event count.
#[derive(Debug, Default)]
pub struct Counter {
    count: AtomicU64,
}

impl Counter {
    pub fn inc(&self) {
        self.inc_by(1);
    }

    pub fn inc_by(&self, n: u64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

/// Last-written floating point value.
#[derive(Debug, Default)]
pub struct Gauge {
    bits: AtomicU64,
}

impl Gauge {
    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

/// Event count with a mean rate since creation.
#[derive(Debug)]
pub struct Meter {
    count: AtomicU64,
    created: Instant,
}

impl Meter {
    fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            created: Instant::now(),
        }
    }

    pub fn mark(&self, n: u64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Events per second since the meter was created.
    pub fn mean_rate(&self) -> f64 {
        let elapsed = self.created.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.count() as f64 / elapsed
        } else {
            0.0
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct TimerStats {
    count: u64,
    total: Duration,
    max: Duration,
}

/// Aggregates recorded durations.
#[derive(Debug, Default)]
pub struct Timer {
    stats: Mutex<TimerStats>,
}

impl Timer {
    pub fn record(&self, elapsed: Duration) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        stats.count += 1;
        stats.total += elapsed;
        stats.max = stats.max.max(elapsed);
    }

    /// Run `f` and record how long it took.
    pub fn time<R>(&self, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let out = f();
        self.record(start.elapsed());
        out
    }

    pub fn count(&self) -> u64 {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner).count
    }

    fn value(&self) -> MetricValue {
        let stats = *self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        let mean = if stats.count > 0 {
            Duration::from_nanos((stats.total.as_nanos() / u128::from(stats.count)) as u64)
        } else {
            Duration::ZERO
        };
        MetricValue::Timer {
            count: stats.count,
            mean,
            max: stats.max,
        }
    }
}

/// In-memory metric registry keyed by name.
///
/// Accessors are get-or-create and hand out shared handles, so callers can
/// cache the `Arc` and update it without touching the registry again.
#[derive(Debug, Default)]
pub struct Registry {
    counters: RwLock<BTreeMap<String, Arc<Counter>>>,
    gauges: RwLock<BTreeMap<String, Arc<Gauge>>>,
    meters: RwLock<BTreeMap<String, Arc<Meter>>>,
    timers: RwLock<BTreeMap<String, Arc<Timer>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> Arc<Counter> {
        get_or_insert(&self.counters, name, Counter::default)
    }

    pub fn gauge(&self, name: &str) -> Arc<Gauge> {
        get_or_insert(&self.gauges, name, Gauge::default)
    }

    pub fn meter(&self, name: &str) -> Arc<Meter> {
        get_or_insert(&self.meters, name, Meter::new)
    }

    pub fn timer(&self, name: &str) -> Arc<Timer> {
        get_or_insert(&self.timers, name, Timer::default)
    }

    /// Number of registered metrics across all kinds.
    pub fn len(&self) -> usize {
        read(&self.counters).len()
            + read(&self.gauges).len()
            + read(&self.meters).len()
            + read(&self.timers).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetricSource for Registry {
    fn snapshot(&self) -> Vec<MetricReading> {
        let mut readings = Vec::with_capacity(self.len());

        for (name, c) in read(&self.counters).iter() {
            readings.push(MetricReading::new(name.clone(), MetricValue::Counter(c.get())));
        }
        for (name, g) in read(&self.gauges).iter() {
            readings.push(MetricReading::new(name.clone(), MetricValue::Gauge(g.get())));
        }
        for (name, m) in read(&self.meters).iter() {
            readings.push(MetricReading::new(
                name.clone(),
                MetricValue::Meter {
                    count: m.count(),
                    mean_rate: m.mean_rate(),
                },
            ));
        }
        for (name, t) in read(&self.timers).iter() {
            readings.push(MetricReading::new(name.clone(), t.value()));
        }

        readings.sort_by(|a, b| a.name.cmp(&b.name));
        readings
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn get_or_insert<T>(
    map: &RwLock<BTreeMap<String, Arc<T>>>,
    name: &str,
    make: impl FnOnce() -> T,
) -> Arc<T> {
    if let Some(existing) = read(map).get(name) {
        return existing.clone();
    }
    let mut map = map.write().unwrap_or_else(PoisonError::into_inner);
    map.entry(name.to_string())
        .or_insert_with(|| {
            debug!(metric = %name, "registered metric");
            Arc::new(make())
        })
        .clone()
}
