//! Per-run statistics

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::{WorkResult, WorkStatus};

/// Counters owned by one run, safe to update from worker threads
#[derive(Debug)]
pub struct RunStatistics {
    processed: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    api_calls: AtomicU64,
    started: Instant,
}

impl Default for RunStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStatistics {
    /// Fresh counters, clock started now
    pub fn new() -> Self {
        Self {
            processed: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            api_calls: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Fold one result into the counters
    pub fn record(&self, result: &WorkResult) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        let counter = match result.status {
            WorkStatus::Done => &self.succeeded,
            WorkStatus::Failed | WorkStatus::Error => &self.failed,
            WorkStatus::Skipped => &self.skipped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Fold a batch of results
    pub fn record_all<'a>(&self, results: impl IntoIterator<Item = &'a WorkResult>) {
        for result in results {
            self.record(result);
        }
    }

    /// Count successes that did not produce a [`WorkResult`]
    pub fn add_succeeded(&self, count: u64) {
        self.processed.fetch_add(count, Ordering::Relaxed);
        self.succeeded.fetch_add(count, Ordering::Relaxed);
    }

    /// Count failures that did not produce a [`WorkResult`]
    pub fn add_failed(&self, count: u64) {
        self.processed.fetch_add(count, Ordering::Relaxed);
        self.failed.fetch_add(count, Ordering::Relaxed);
    }

    /// Count items filtered out before processing
    ///
    /// They count as processed, the same as a recorded [`WorkStatus::Skipped`] result.
    pub fn add_skipped(&self, count: u64) {
        self.processed.fetch_add(count, Ordering::Relaxed);
        self.skipped.fetch_add(count, Ordering::Relaxed);
    }

    /// Count remote calls
    pub fn add_api_calls(&self, count: u64) {
        self.api_calls.fetch_add(count, Ordering::Relaxed);
    }

    /// Time since the run started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> StatisticsSnapshot {
        let processed = self.processed.load(Ordering::Relaxed);
        let succeeded = self.succeeded.load(Ordering::Relaxed);
        let elapsed = self.elapsed();
        let success_rate = if processed > 0 {
            succeeded as f64 / processed as f64 * 100.0
        } else {
            0.0
        };

        StatisticsSnapshot {
            processed,
            succeeded,
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            api_calls: self.api_calls.load(Ordering::Relaxed),
            elapsed_secs: elapsed.as_secs_f64(),
            success_rate,
            duration: format_duration(elapsed),
        }
    }
}

/// Serializable copy of [`RunStatistics`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSnapshot {
    /// Items that reached a unit of work
    pub processed: u64,
    /// Items that ended `Done`
    pub succeeded: u64,
    /// Items that ended `Failed` or `Error`
    pub failed: u64,
    /// Items skipped before or during processing
    pub skipped: u64,
    /// Remote calls issued
    pub api_calls: u64,
    /// Wall time in seconds
    pub elapsed_secs: f64,
    /// Percentage of processed items that succeeded
    pub success_rate: f64,
    /// Human-readable wall time
    pub duration: String,
}

/// Format a duration as `42s`, `7m` or `1.5h`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{:.1}h", secs as f64 / 3600.0)
    }
}
