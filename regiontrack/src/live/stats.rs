//! Live loop statistics.
//!
//! Atomic counters updated by the streaming loop and read as snapshots, in
//! the same shape as the runtime health monitor.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tracing::info;

/// A point-in-time snapshot of loop statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopStatsSnapshot {
    /// Streaming ticks started.
    pub ticks: u64,
    /// Ticks that produced a map.
    pub renders: u64,
    /// Times the resolved region changed (including the first resolution).
    pub region_changes: u64,
    /// Per-tick errors reported to the display.
    pub transient_errors: u64,
    /// Ticks skipped because a render was still running.
    pub busy_ticks: u64,
    /// Display calls that failed.
    pub display_failures: u64,
    /// Time since the loop started streaming.
    pub streaming_for: Duration,
}

impl LoopStatsSnapshot {
    /// Fraction of ticks that produced a map.
    pub fn render_rate(&self) -> f64 {
        if self.ticks == 0 {
            0.0
        } else {
            self.renders as f64 / self.ticks as f64
        }
    }
}

/// Loop counters.
#[derive(Debug)]
pub struct LoopStats {
    ticks: AtomicU64,
    renders: AtomicU64,
    region_changes: AtomicU64,
    transient_errors: AtomicU64,
    busy_ticks: AtomicU64,
    /// Streaming start, as micros since `created`; 0 until streaming.
    streaming_since_micros: AtomicU64,
    created: Instant,
}

impl Default for LoopStats {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopStats {
    pub fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            renders: AtomicU64::new(0),
            region_changes: AtomicU64::new(0),
            transient_errors: AtomicU64::new(0),
            busy_ticks: AtomicU64::new(0),
            streaming_since_micros: AtomicU64::new(0),
            created: Instant::now(),
        }
    }

    pub fn streaming_started(&self) {
        let micros = self.created.elapsed().as_micros().max(1) as u64;
        self.streaming_since_micros.store(micros, Ordering::Relaxed);
    }

    pub fn tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render(&self) {
        self.renders.fetch_add(1, Ordering::Relaxed);
    }

    pub fn region_changed(&self) {
        self.region_changes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render_busy(&self) {
        self.busy_ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a transient error; returns the new total.
    pub fn transient_error(&self) -> u64 {
        self.transient_errors.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn snapshot(&self, display_failures: u64) -> LoopStatsSnapshot {
        let since = self.streaming_since_micros.load(Ordering::Relaxed);
        let streaming_for = if since == 0 {
            Duration::ZERO
        } else {
            self.created
                .elapsed()
                .saturating_sub(Duration::from_micros(since))
        };

        LoopStatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            renders: self.renders.load(Ordering::Relaxed),
            region_changes: self.region_changes.load(Ordering::Relaxed),
            transient_errors: self.transient_errors.load(Ordering::Relaxed),
            busy_ticks: self.busy_ticks.load(Ordering::Relaxed),
            display_failures,
            streaming_for,
        }
    }
}

/// Log the end-of-run summary.
pub fn log_summary(snapshot: &LoopStatsSnapshot) {
    info!(
        ticks = snapshot.ticks,
        renders = snapshot.renders,
        region_changes = snapshot.region_changes,
        transient_errors = snapshot.transient_errors,
        busy_ticks = snapshot.busy_ticks,
        display_failures = snapshot.display_failures,
        streaming_secs = snapshot.streaming_for.as_secs(),
        render_rate = format!("{:.2}", snapshot.render_rate()),
        "Live loop statistics"
    );
}
