//! Search reports
//!
//! A [`ReportSource`] knows how to count and fetch one kind of document for a date
//! range; [`ReportPipeline`] drives it through range splitting, parallel fetching,
//! an optional URL status check and CSV export.

pub mod pipeline;
pub mod record;
pub mod sources;

pub use pipeline::{ReportPipeline, StatusCheckRequest};
pub use record::{RedirectRow, WireRow};
pub use sources::{RedirectReport, WireReport};

use serde::Serialize;
use std::path::PathBuf;

use crate::api::{ApiError, ApiResult};
use crate::output::{CsvRecord, OutputError};
use crate::processor::ProcessorError;
use crate::range::{DateRange, RangeError};
use crate::status::{StatusError, StatusTarget};

/// A kind of document a report can be built from
pub trait ReportSource: Sync {
    /// Row type written to the report
    type Row: CsvRecord + StatusTarget + Send;

    /// Short name for logs and labels
    fn name(&self) -> &str;

    /// Website searched
    fn website(&self) -> &str;

    /// Total hits within `range`
    fn probe(&self, range: &DateRange) -> ApiResult<u64>;

    /// All rows within `range`, or without a date filter when `None`
    fn fetch(&self, range: Option<&DateRange>) -> ApiResult<Vec<Self::Row>>;
}

/// Outcome of one report run
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    /// Rows exported
    pub rows: usize,
    /// Date ranges fetched (0 for an unranged fetch)
    pub ranges: usize,
    /// Ranges whose fetch failed
    pub failed_ranges: usize,
    /// Report file, absent when there were no rows
    pub output_path: Option<PathBuf>,
    /// Worker count used for range fetches
    pub workers: usize,
    /// Whether URL statuses were checked
    pub status_checked: bool,
    /// Wall time in seconds
    pub elapsed_secs: f64,
    /// Human-readable wall time
    pub duration: String,
}

/// Report errors
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Invalid date window
    #[error(transparent)]
    Range(#[from] RangeError),

    /// Unranged fetch failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Executor could not be built
    #[error(transparent)]
    Processor(#[from] ProcessorError),

    /// Status check could not run
    #[error(transparent)]
    Status(#[from] StatusError),

    /// Export failed
    #[error(transparent)]
    Output(#[from] OutputError),

    /// Invalid pipeline settings
    #[error("invalid report configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;
