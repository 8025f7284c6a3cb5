//! Bounded parallel processing
//!
//! # Overview
//!
//! Everything that fans out remote calls on OS threads lives here:
//!
//! - [`RateGovernor`]: uniform pacing shared by every worker hitting one endpoint family
//! - [`ParallelExecutor`]: fixed-size worker pool, chunked submission, per-item isolation
//! - [`optimize_worker_count`]: one-shot worker-count profiling over a small sample
//! - [`RunStatistics`]: atomic per-run counters folded from [`WorkResult`]s
//!
//! # Quick Start
//!
//! ```no_run
//! use content_audit::processor::ParallelExecutor;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = ParallelExecutor::new(4, 100)?;
//! let ids: Vec<String> = (0..10).map(|i| format!("item-{i}")).collect();
//!
//! let outcome = executor.process(&ids, |id| -> Result<Option<usize>, String> {
//!     Ok(Some(id.len()))
//! });
//! assert_eq!(outcome.results.len(), 10);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! A unit of work that returns `Err` or panics is recorded as an [`ItemFailure`] with the
//! item's identity; the rest of the batch keeps running. Callers that need a row per
//! item convert failures into [`WorkResult`]s with [`WorkResult::error`].

pub mod config;
pub mod executor;
pub mod optimizer;
pub mod rate_limit;
pub mod stats;

pub use executor::{progress_bar, BatchOutcome, ItemFailure, ParallelExecutor};
pub use optimizer::{optimize_worker_count, OptimizerReport};
pub use rate_limit::{RateGovernor, RateLimitError};
pub use stats::{format_duration, RunStatistics, StatisticsSnapshot};

use serde::Serialize;
use std::fmt;

/// Processor errors
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    /// Worker pool could not be built
    #[error("thread pool error: {0}")]
    ThreadPool(String),

    /// Invalid executor settings
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Rate governor error
    #[error("rate limit error: {0}")]
    RateLimit(#[from] RateLimitError),
}

/// Result type for processor operations
pub type ProcessorResult<T> = Result<T, ProcessorError>;

/// Outcome category of one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkStatus {
    /// The remote call succeeded
    Done,
    /// The remote call answered with a non-success status
    Failed,
    /// The call never produced an answer (transport error, panic)
    Error,
    /// The item was intentionally not processed
    Skipped,
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkStatus::Done => "done",
            WorkStatus::Failed => "failed",
            WorkStatus::Error => "error",
            WorkStatus::Skipped => "skipped",
        };
        f.write_str(label)
    }
}

/// What a unit of work attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkAction {
    /// Hard delete
    Delete,
    /// Expire / unpublish in place
    Expire,
    /// Keep the item (analysis found it in use)
    Preserve,
}

impl fmt::Display for WorkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkAction::Delete => "delete",
            WorkAction::Expire => "expire",
            WorkAction::Preserve => "preserve",
        };
        f.write_str(label)
    }
}

/// Tagged outcome of one work item, never mutated after creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkResult {
    /// Item identity (photo id, story id, `website:url`)
    pub identifier: String,
    /// Attempted action
    pub action: WorkAction,
    /// Outcome
    pub status: WorkStatus,
    /// HTTP status code, when one was received
    pub response_code: Option<u16>,
    /// Error message for failed or errored items
    pub error: Option<String>,
}

impl WorkResult {
    /// Successful action
    pub fn done(identifier: impl Into<String>, action: WorkAction, code: u16) -> Self {
        Self {
            identifier: identifier.into(),
            action,
            status: WorkStatus::Done,
            response_code: Some(code),
            error: None,
        }
    }

    /// Remote answered with a non-success status
    pub fn failed(
        identifier: impl Into<String>,
        action: WorkAction,
        code: u16,
        message: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            action,
            status: WorkStatus::Failed,
            response_code: Some(code),
            error: Some(message.into()),
        }
    }

    /// No answer from the remote
    pub fn error(identifier: impl Into<String>, action: WorkAction, message: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            action,
            status: WorkStatus::Error,
            response_code: None,
            error: Some(message.into()),
        }
    }

    /// Item deliberately left alone
    pub fn skipped(identifier: impl Into<String>, action: WorkAction, reason: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            action,
            status: WorkStatus::Skipped,
            response_code: None,
            error: Some(reason.into()),
        }
    }

    /// True for `Done`
    pub fn is_success(&self) -> bool {
        self.status == WorkStatus::Done
    }
}
