//! Chunked parallel executor over a reusable rayon pool

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span};

use super::config::{chunk_count, MAX_WORKERS};
use super::{ProcessorError, ProcessorResult};

/// One item that did not complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// Display form of the offending item
    pub item: String,
    /// Error or panic message
    pub message: String,
}

/// Aggregated output of one `process` call
#[derive(Debug)]
pub struct BatchOutcome<T> {
    /// Values produced by successful units
    pub results: Vec<T>,
    /// Units that returned an error or panicked
    pub failures: Vec<ItemFailure>,
    /// Units that succeeded with nothing to report
    pub empty: usize,
    /// Wall time of the whole batch
    pub elapsed: Duration,
}

impl<T> BatchOutcome<T> {
    /// Units that finished without error, with or without a value
    pub fn completed(&self) -> usize {
        self.results.len() + self.empty
    }

    /// Completed units per second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.completed() as f64 / secs
        } else {
            0.0
        }
    }
}

enum ItemOutcome<T> {
    Value(T),
    Empty,
    Failed(ItemFailure),
}

/// Fixed-size worker pool processing items chunk by chunk
///
/// The pool is built once and reused for every chunk and every call to
/// [`process`](Self::process). Chunks run one after another; within a chunk at most
/// `max_workers` units run at the same time.
pub struct ParallelExecutor {
    pool: ThreadPool,
    max_workers: usize,
    chunk_size: usize,
    label: String,
    progress: Option<ProgressBar>,
}

impl fmt::Debug for ParallelExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallelExecutor")
            .field("max_workers", &self.max_workers)
            .field("chunk_size", &self.chunk_size)
            .field("label", &self.label)
            .finish()
    }
}

impl ParallelExecutor {
    /// Create an executor with `max_workers` threads and the given chunk size
    pub fn new(max_workers: usize, chunk_size: usize) -> ProcessorResult<Self> {
        if max_workers == 0 || max_workers > MAX_WORKERS {
            return Err(ProcessorError::InvalidConfig(format!(
                "max_workers must be between 1 and {MAX_WORKERS}, got {max_workers}"
            )));
        }
        if chunk_size == 0 {
            return Err(ProcessorError::InvalidConfig(
                "chunk_size must be at least 1".to_string(),
            ));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(max_workers)
            .thread_name(|index| format!("content-audit-worker-{index}"))
            .build()
            .map_err(|e| ProcessorError::ThreadPool(e.to_string()))?;

        Ok(Self {
            pool,
            max_workers,
            chunk_size,
            label: "items".to_string(),
            progress: None,
        })
    }

    /// Name used in log lines ("ranges", "photos", ...)
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Advance a progress bar by one per finished item
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Worker ceiling
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Items per chunk
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Run `unit` over every item
    ///
    /// `Ok(Some(v))` collects `v`, `Ok(None)` counts as empty, `Err(e)` and panics become
    /// [`ItemFailure`]s. Result order is not tied to input order.
    pub fn process<I, T, E, F>(&self, items: &[I], unit: F) -> BatchOutcome<T>
    where
        I: Sync + fmt::Display,
        T: Send,
        E: fmt::Display,
        F: Fn(&I) -> Result<Option<T>, E> + Sync,
    {
        let span = info_span!("parallel_batch", label = %self.label, workers = self.max_workers);
        let _guard = span.enter();

        let started = Instant::now();
        let total_chunks = chunk_count(items.len(), self.chunk_size);
        info!(
            total = items.len(),
            chunks = total_chunks,
            workers = self.max_workers,
            "Starting parallel processing of {}",
            self.label
        );

        let mut outcome = BatchOutcome {
            results: Vec::with_capacity(items.len()),
            failures: Vec::new(),
            empty: 0,
            elapsed: Duration::ZERO,
        };

        for (index, chunk) in items.chunks(self.chunk_size).enumerate() {
            debug!(
                chunk = index + 1,
                chunks = total_chunks,
                size = chunk.len(),
                "Processing chunk"
            );

            let chunk_outcomes: Vec<ItemOutcome<T>> = self.pool.install(|| {
                chunk
                    .par_iter()
                    .map(|item| {
                        let result = run_isolated(item, &unit);
                        if let Some(progress) = &self.progress {
                            progress.inc(1);
                        }
                        result
                    })
                    .collect()
            });

            for item_outcome in chunk_outcomes {
                match item_outcome {
                    ItemOutcome::Value(value) => outcome.results.push(value),
                    ItemOutcome::Empty => outcome.empty += 1,
                    ItemOutcome::Failed(failure) => outcome.failures.push(failure),
                }
            }
        }

        if let Some(progress) = &self.progress {
            if progress.length().is_some_and(|len| progress.position() >= len) {
                progress.finish_and_clear();
            }
        }

        outcome.elapsed = started.elapsed();
        info!(
            results = outcome.results.len(),
            empty = outcome.empty,
            failures = outcome.failures.len(),
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "Completed parallel processing of {}",
            self.label
        );
        outcome
    }
}

impl Drop for ParallelExecutor {
    fn drop(&mut self) {
        if let Some(progress) = self.progress.take().filter(|p| !p.is_finished()) {
            progress.finish_and_clear();
        }
    }
}

fn run_isolated<I, T, E, F>(item: &I, unit: &F) -> ItemOutcome<T>
where
    I: fmt::Display,
    E: fmt::Display,
    F: Fn(&I) -> Result<Option<T>, E>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| unit(item))) {
        Ok(Ok(Some(value))) => ItemOutcome::Value(value),
        Ok(Ok(None)) => ItemOutcome::Empty,
        Ok(Err(e)) => {
            error!(item = %item, error = %e, "Error processing item");
            ItemOutcome::Failed(ItemFailure {
                item: item.to_string(),
                message: e.to_string(),
            })
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(item = %item, panic = %message, "Worker panicked while processing item");
            ItemOutcome::Failed(ItemFailure {
                item: item.to_string(),
                message: format!("panicked: {message}"),
            })
        }
    }
}

/// Progress bar advanced once per finished item
pub fn progress_bar(len: u64, message: impl Into<String>) -> ProgressBar {
    let bar = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
    {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar.set_message(message.into());
    bar
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
