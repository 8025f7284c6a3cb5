//! Range-split, parallel-fetch, status-check, export

use std::path::Path;
use std::time::Instant;
use tracing::{info, info_span, warn};

use super::{ReportError, ReportResult, ReportSource, ReportSummary};
use crate::output::write_records;
use crate::processor::config::{
    DEFAULT_RANGE_CHUNK_SIZE, DEFAULT_REPORT_WORKERS, RANGE_OPTIMIZER_CANDIDATES,
    RANGE_OPTIMIZER_SAMPLE,
};
use crate::processor::{format_duration, optimize_worker_count, progress_bar, ParallelExecutor};
use crate::range::{DateRange, RangeSplitter};
use crate::status::{check_all_blocking, merge_statuses, StatusCheckConfig, StatusTarget};

/// Status check requested for a report
#[derive(Debug, Clone)]
pub struct StatusCheckRequest {
    /// Domain relative URLs are resolved against
    pub domain: String,
    /// Checker settings
    pub config: StatusCheckConfig,
}

/// Report orchestration: `BuildRanges → FetchPerRange → [StatusCheck] → Export`
#[derive(Debug, Clone)]
pub struct ReportPipeline {
    splitter: RangeSplitter,
    max_workers: usize,
    chunk_size: usize,
    auto_optimize: bool,
    status_check: Option<StatusCheckRequest>,
    show_progress: bool,
}

impl Default for ReportPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPipeline {
    /// Pipeline with default splitter, worker count and range chunk size
    pub fn new() -> Self {
        Self {
            splitter: RangeSplitter::new(),
            max_workers: DEFAULT_REPORT_WORKERS,
            chunk_size: DEFAULT_RANGE_CHUNK_SIZE,
            auto_optimize: false,
            status_check: None,
            show_progress: false,
        }
    }

    /// Use a custom splitter
    pub fn with_splitter(mut self, splitter: RangeSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    /// Worker count for range fetches
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers;
        self
    }

    /// Ranges per chunk
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Profile worker counts on a sample before the main batch
    pub fn with_auto_optimize(mut self, enabled: bool) -> Self {
        self.auto_optimize = enabled;
        self
    }

    /// Check each row's URL after fetching
    pub fn with_status_check(mut self, request: StatusCheckRequest) -> Self {
        self.status_check = Some(request);
        self
    }

    /// Show a progress bar over ranges
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Date ranges to fetch; empty when no window was requested
    pub fn build_ranges<S: ReportSource>(&self, source: &S, window: Option<&DateRange>) -> Vec<DateRange> {
        let Some(window) = window else {
            info!("No date range specified, fetching all dates");
            return Vec::new();
        };
        let ranges = self.splitter.split(window, &|range: &DateRange| source.probe(range));
        info!(window = %window, ranges = ranges.len(), "Built date ranges");
        ranges
    }

    /// Run the whole pipeline and write the report to `output_path`
    ///
    /// No file is left behind when the report has no rows.
    pub fn run<S: ReportSource>(
        &self,
        source: &S,
        window: Option<&DateRange>,
        output_path: &Path,
    ) -> ReportResult<ReportSummary> {
        let span = info_span!("report", source = source.name(), website = source.website());
        let _guard = span.enter();
        let started = Instant::now();

        let ranges = self.build_ranges(source, window);
        let (mut rows, workers, failed_ranges) = if ranges.is_empty() {
            if window.is_some() {
                return Err(ReportError::InvalidConfig("range splitting produced no ranges".to_string()));
            }
            (source.fetch(None)?, 1, 0)
        } else {
            self.fetch_ranges(source, &ranges)?
        };
        info!(rows = rows.len(), "Fetch stage complete");

        let status_checked = match &self.status_check {
            Some(request) => {
                let urls: Vec<String> = rows
                    .iter()
                    .filter_map(|row| row.status_url().map(str::to_string))
                    .collect();
                let statuses = check_all_blocking(&request.domain, request.config, &urls)?;
                merge_statuses(&mut rows, &statuses);
                true
            }
            None => false,
        };

        let output = write_records(output_path, &rows)?;
        match &output {
            Some(path) => info!(path = %path.display(), rows = rows.len(), "Report exported"),
            None => warn!("No data to export"),
        }

        let elapsed = started.elapsed();
        Ok(ReportSummary {
            rows: rows.len(),
            ranges: ranges.len(),
            failed_ranges,
            output_path: output,
            workers,
            status_checked,
            elapsed_secs: elapsed.as_secs_f64(),
            duration: format_duration(elapsed),
        })
    }

    fn fetch_ranges<S: ReportSource>(
        &self,
        source: &S,
        ranges: &[DateRange],
    ) -> ReportResult<(Vec<S::Row>, usize, usize)> {
        let unit = |range: &DateRange| source.fetch(Some(range)).map(Some);

        let workers = if self.auto_optimize && ranges.len() > RANGE_OPTIMIZER_SAMPLE {
            optimize_worker_count(
                &ranges[..RANGE_OPTIMIZER_SAMPLE],
                RANGE_OPTIMIZER_CANDIDATES,
                self.chunk_size,
                self.max_workers,
                unit,
            )
            .workers
        } else {
            self.max_workers
        };

        let mut executor = ParallelExecutor::new(workers, self.chunk_size)?
            .with_label(format!("{} ranges", source.name()));
        if self.show_progress {
            executor = executor.with_progress(progress_bar(ranges.len() as u64, source.name()));
        }

        let outcome = executor.process(ranges, unit);
        for failure in &outcome.failures {
            warn!(range = %failure.item, error = %failure.message, "Range fetch failed");
        }
        let failed = outcome.failures.len();
        let rows = outcome.results.into_iter().flatten().collect();
        Ok((rows, workers, failed))
    }
}
