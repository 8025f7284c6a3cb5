//! Bulk cleanup: redirect, story and photo removal, plus photo usage analysis
//!
//! Every removal is a [`CleanupAction`]: one remote operation per item. [`run_cleanup`]
//! fans the items out over a [`ParallelExecutor`], turns each outcome into a
//! [`WorkResult`] and folds the results into [`RunStatistics`] on the calling thread.
//!
//! Dry runs never touch the network: every item reports `Done` with response 200.

pub mod actions;
pub mod analysis;
pub mod input;

pub use actions::{mark_expired, PhotoRemoval, RedirectDeletion, RemovalMode, StoryDeletion};
pub use analysis::{AnalysisOutcome, AnalysisSummary, PhotoAnalysis, PhotoCandidates, PreservedPhoto};
pub use input::{
    filter_preserved, preserved_ids_for, read_ids, read_preserved_ids, read_redirect_targets,
    RedirectTarget,
};

use serde::Serialize;
use std::fmt;
use tracing::{error, info};

use crate::api::{ApiClient, ApiError, ApiResult, RawResponse};
use crate::cache::CacheError;
use crate::output::OutputError;
use crate::processor::{
    ParallelExecutor, ProcessorError, RunStatistics, StatisticsSnapshot, WorkAction, WorkResult,
    WorkStatus,
};

/// One kind of per-item removal
pub trait CleanupAction: Sync {
    /// Work item
    type Item: Sync + fmt::Display;

    /// What the action does to an item
    fn kind(&self) -> WorkAction;

    /// Client issuing the calls, used for call accounting
    fn client(&self) -> &ApiClient;

    /// Perform the action; any HTTP status is returned as a response
    fn apply(&self, item: &Self::Item) -> ApiResult<RawResponse>;
}

/// Results and statistics of one cleanup run
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Per-item results, in completion order
    pub results: Vec<WorkResult>,
    /// Counters at the end of the run
    pub statistics: StatisticsSnapshot,
}

impl CleanupReport {
    /// Results that did not end `Done` or `Skipped`
    pub fn failures(&self) -> impl Iterator<Item = &WorkResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.status, WorkStatus::Failed | WorkStatus::Error))
    }
}

/// Apply `action` to every item
///
/// Per-item failures never abort the run. Non-2xx answers become `Failed` results with
/// the status code; transport errors and panics become `Error` results.
pub fn run_cleanup<A: CleanupAction>(
    action: &A,
    items: &[A::Item],
    executor: &ParallelExecutor,
    dry_run: bool,
    statistics: &RunStatistics,
) -> CleanupReport {
    let kind = action.kind();
    let calls_before = action.client().calls_made();
    info!(
        items = items.len(),
        action = %kind,
        dry_run,
        workers = executor.max_workers(),
        "Starting cleanup"
    );

    let outcome = executor.process(items, |item: &A::Item| -> ApiResult<Option<WorkResult>> {
        let id = item.to_string();
        if dry_run {
            info!("[DRY RUN] Would {} {}", kind, id);
            return Ok(Some(WorkResult::done(id, kind, 200)));
        }

        match action.apply(item) {
            Ok(response) if response.is_success() => {
                info!("Successfully {}d {}", kind, id);
                Ok(Some(WorkResult::done(id, kind, response.status)))
            }
            Ok(response) => {
                error!("Failed to {} {}: {} - {}", kind, id, response.status, response.body);
                Ok(Some(WorkResult::failed(id, kind, response.status, response.body)))
            }
            Err(ApiError::HttpError { status, body }) => {
                error!("Failed to {} {}: {} - {}", kind, id, status, body);
                Ok(Some(WorkResult::failed(id, kind, status, body)))
            }
            Err(e) => Err(e),
        }
    });

    let mut results = outcome.results;
    results.extend(
        outcome
            .failures
            .into_iter()
            .map(|failure| WorkResult::error(failure.item, kind, failure.message)),
    );

    statistics.record_all(&results);
    statistics.add_api_calls(action.client().calls_made().saturating_sub(calls_before));
    let snapshot = statistics.snapshot();
    info!(
        succeeded = snapshot.succeeded,
        failed = snapshot.failed,
        skipped = snapshot.skipped,
        api_calls = snapshot.api_calls,
        duration = %snapshot.duration,
        "Cleanup complete"
    );

    CleanupReport {
        dry_run,
        results,
        statistics: snapshot,
    }
}

/// Cleanup errors
#[derive(Debug, thiserror::Error)]
pub enum CleanupError {
    /// Input file missing or unreadable
    #[error("input error: {0}")]
    InputError(String),

    /// Candidate listing failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Executor could not be built
    #[error(transparent)]
    Processor(#[from] ProcessorError),

    /// Lightbox cache unavailable
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Writing results failed
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Result type for cleanup operations
pub type CleanupResult<T> = Result<T, CleanupError>;
