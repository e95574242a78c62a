//! Run metrics and logging setup.
//!
//! Counters are atomic so parallel node workers can report into one
//! collector.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Metrics collector for one simulation run.
pub struct Metrics {
    step_count: AtomicU64,
    event_count: AtomicU64,
    degenerate_nodes: AtomicU64,
    log_interval: u64,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl Metrics {
    /// Creates a collector that logs a summary every `log_interval` steps.
    #[must_use]
    pub fn new(log_interval: u64) -> Self {
        Self {
            step_count: AtomicU64::new(0),
            event_count: AtomicU64::new(0),
            degenerate_nodes: AtomicU64::new(0),
            log_interval: log_interval.max(1),
            start_time: Instant::now(),
        }
    }

    /// Records a completed step across all nodes.
    pub fn record_step(&self, duration: Duration, events: u64, total_open: u64) {
        self.step_count.fetch_add(1, Ordering::Relaxed);
        let total_events = self.event_count.fetch_add(events, Ordering::Relaxed) + events;

        let step = self.step_count.load(Ordering::Relaxed);
        if step % self.log_interval == 0 {
            tracing::info!(
                step = step,
                total_open = total_open,
                events = total_events,
                duration_us = duration.as_micros() as u64,
                "Simulation step"
            );
        }
    }

    /// Records a node frozen after degenerate rates.
    pub fn record_degenerate(&self, node: usize, lambda: f64) {
        self.degenerate_nodes.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(node = node, lambda = lambda, "Degenerate rates, node frozen");
    }

    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.event_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn degenerate_nodes(&self) -> u64 {
        self.degenerate_nodes.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Initialize tracing subscriber for logging.
///
/// Honors `RUST_LOG`; defaults to `info`.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish(),
    )
    .ok();
}
