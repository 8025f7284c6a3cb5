//! Worker-count profiling
//!
//! Runs the real unit of work over a small sample once per candidate worker count and
//! keeps the count with the highest completed-items-per-second. This happens once,
//! before the main batch; the chosen count is fixed for the rest of the run.

use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

use super::executor::ParallelExecutor;

/// Outcome of one optimization run
#[derive(Debug, Clone, Serialize)]
pub struct OptimizerReport {
    /// Chosen worker count
    pub workers: usize,
    /// Throughput measured for the chosen count
    pub items_per_second: f64,
    /// Every `(workers, items_per_second)` pair measured
    pub trials: Vec<(usize, f64)>,
}

/// Pick the fastest worker count among `candidates`
///
/// Returns `fallback` when the sample is empty or no candidate completed anything.
/// Ties keep the smaller worker count.
pub fn optimize_worker_count<I, T, E, F>(
    sample: &[I],
    candidates: &[usize],
    chunk_size: usize,
    fallback: usize,
    unit: F,
) -> OptimizerReport
where
    I: Sync + fmt::Display,
    T: Send,
    E: fmt::Display,
    F: Fn(&I) -> Result<Option<T>, E> + Sync,
{
    let mut report = OptimizerReport {
        workers: fallback,
        items_per_second: 0.0,
        trials: Vec::with_capacity(candidates.len()),
    };

    if sample.is_empty() {
        warn!("No sample items for worker optimization, keeping {} workers", fallback);
        return report;
    }

    info!(
        sample = sample.len(),
        candidates = ?candidates,
        "Finding optimal worker count"
    );

    for &workers in candidates {
        let executor = match ParallelExecutor::new(workers, chunk_size.max(1)) {
            Ok(executor) => executor.with_label("optimizer sample"),
            Err(e) => {
                warn!(workers, error = %e, "Skipping worker candidate");
                continue;
            }
        };

        let outcome = executor.process(sample, &unit);
        let throughput = outcome.throughput();
        info!(workers, items_per_second = throughput, "Worker candidate measured");
        report.trials.push((workers, throughput));

        if throughput > report.items_per_second {
            report.items_per_second = throughput;
            report.workers = workers;
        }
    }

    info!(
        workers = report.workers,
        items_per_second = report.items_per_second,
        "Optimal worker count selected"
    );
    report
}
