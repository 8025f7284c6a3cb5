//! # Content Audit Library
//!
//! Enumerate, audit and bulk-clean records of a content platform through its REST API:
//! redirects, unpublished wire stories and unused photos.
//!
//! ## Features
//!
//! - **Range Splitting**: recursive bisection of a date window until every sub-range fits
//!   under the search backend's result ceiling
//! - **Bounded Parallelism**: one reusable worker pool per run, chunked submission, per-item
//!   failure isolation and optional worker-count profiling
//! - **Rate Limiting**: uniform pacing shared by every worker hitting the same API
//! - **Status Checks**: async GET status checks of public URLs, deduplicated
//! - **Photo Analysis**: references, gallery usage and lightbox membership, with a
//!   resumable local lightbox cache
//! - **Bulk Cleanup**: redirect and story deletes, photo expire or delete, with dry runs
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use content_audit::api::{ApiClient, ArcEnvironment, ContentSearch};
//! use content_audit::processor::RateGovernor;
//! use content_audit::range::DateRange;
//! use content_audit::report::{RedirectReport, ReportPipeline};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = ArcEnvironment::Production;
//! let client = ApiClient::new(env.base_url("acme"), "token")?
//!     .with_governor(Arc::new(RateGovernor::per_minute(20)?));
//! let source = RedirectReport::new(ContentSearch::new(Arc::new(client), "acme-site"), env);
//!
//! let window = DateRange::parse("2024-01-01", "2024-06-30")?;
//! let summary = ReportPipeline::new()
//!     .with_workers(5)
//!     .run(&source, Some(&window), Path::new("spreadsheets/redirects.csv"))?;
//! println!("{} rows in {} ranges", summary.rows, summary.ranges);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`range`] - date ranges and the recursive range splitter
//! - [`processor`] - rate governor, parallel executor, worker optimizer, run statistics
//! - [`api`] - blocking API clients (search, draft, photo)
//! - [`status`] - async URL status checks
//! - [`report`] - report pipeline and the redirect / wire report sources
//! - [`output`] - CSV sink and file naming
//! - [`cache`] - lightbox presence cache
//! - [`cleanup`] - delete / expire actions and photo analysis
//! - [`cli`] - command line interface
//!
//! The CRUD and search paths are synchronous and run on OS threads; only status checks
//! run on an async runtime, created and torn down per call.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Content platform API clients
pub mod api;

/// Lightbox presence cache
pub mod cache;

/// Bulk delete / expire actions and photo analysis
pub mod cleanup;

/// CLI command implementations
pub mod cli;

/// CSV output and file naming
pub mod output;

/// Bounded parallel processing
pub mod processor;

/// Date ranges and range splitting
pub mod range;

/// Search-backed CSV reports
pub mod report;

/// Async URL status checks
pub mod status;

// Re-export commonly used types
pub use api::{ApiClient, ApiError, ArcEnvironment};
pub use processor::{ParallelExecutor, RateGovernor, WorkAction, WorkResult, WorkStatus};
pub use range::{DateRange, RangeSplitter};
pub use report::{ReportPipeline, ReportSource, ReportSummary};
