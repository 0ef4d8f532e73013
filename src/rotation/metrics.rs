//! Watch-loop counters surfaced through periodic structured logs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::info;

/// Activity counters for one watch loop.
#[derive(Debug)]
pub struct WatchMetrics {
    samples: AtomicU64,
    commits: AtomicU64,
    apply_failures: AtomicU64,
    started: Instant,
}

impl WatchMetrics {
    pub fn new() -> Self {
        Self {
            samples: AtomicU64::new(0),
            commits: AtomicU64::new(0),
            apply_failures: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    pub fn record_sample(&self) {
        self.samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_apply_failure(&self) {
        self.apply_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn samples(&self) -> u64 {
        self.samples.load(Ordering::Relaxed)
    }

    pub fn commits(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }

    pub fn apply_failures(&self) -> u64 {
        self.apply_failures.load(Ordering::Relaxed)
    }

    /// Emit a one-line summary of activity since the watch started.
    pub fn log_summary(&self) {
        info!(
            samples = self.samples.load(Ordering::Relaxed),
            commits = self.commits.load(Ordering::Relaxed),
            apply_failures = self.apply_failures.load(Ordering::Relaxed),
            uptime_secs = self.started.elapsed().as_secs(),
            "Autorotate metrics"
        );
    }
}

impl Default for WatchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = WatchMetrics::new();
        metrics.record_sample();
        metrics.record_sample();
        metrics.record_commit();
        metrics.record_apply_failure();
        assert_eq!(metrics.samples(), 2);
        assert_eq!(metrics.commits(), 1);
        assert_eq!(metrics.apply_failures(), 1);
    }
}
