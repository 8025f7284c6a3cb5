//! Argument groups shared by several commands

use clap::Args;
use std::path::PathBuf;

use super::validate::{parse_date_arg, parse_positive, parse_workers, resolve_window};
use super::{Cli, CliError, OutputFormat};
use crate::output::ReportPathBuilder;
use crate::processor::config::{
    DEFAULT_CHUNK_SIZE, DEFAULT_CLEANUP_WORKERS, DEFAULT_REPORT_FOLDER, DEFAULT_REPORT_WORKERS,
    DEFAULT_SEARCH_CALLS_PER_MINUTE,
};
use crate::processor::{progress_bar, ParallelExecutor, RateGovernor};
use crate::range::DateRange;
use crate::report::{ReportSummary, ReportPipeline};

/// Flags common to search-backed reports
#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Website id to search
    #[arg(long)]
    pub website: String,

    /// Window start (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
    #[arg(long, value_parser = parse_date_arg)]
    pub start_date: Option<String>,

    /// Window end (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
    #[arg(long, value_parser = parse_date_arg)]
    pub end_date: Option<String>,

    /// Parallel range fetches
    #[arg(long, default_value_t = DEFAULT_REPORT_WORKERS, value_parser = parse_workers)]
    pub max_workers: usize,

    /// Profile a few worker counts on the first ranges and keep the fastest
    #[arg(long, default_value_t = false)]
    pub auto_optimize_workers: bool,

    /// Search calls allowed per minute
    #[arg(long, default_value_t = DEFAULT_SEARCH_CALLS_PER_MINUTE, value_parser = parse_positive)]
    pub search_rate: u32,

    /// Folder receiving the report
    #[arg(long, default_value = DEFAULT_REPORT_FOLDER)]
    pub report_folder: PathBuf,

    /// Prefix added to the report file name
    #[arg(long)]
    pub output_prefix: Option<String>,
}

impl ReportArgs {
    /// Search window, if both bounds were given
    pub fn window(&self) -> Result<Option<DateRange>, CliError> {
        resolve_window(self.start_date.as_deref(), self.end_date.as_deref())
    }

    /// Report file name builder for this run
    pub fn path_builder(&self) -> ReportPathBuilder {
        let mut builder = ReportPathBuilder::new(&self.report_folder, &self.website);
        if let Some(prefix) = &self.output_prefix {
            builder = builder.with_prefix(prefix);
        }
        if let (Some(start), Some(end)) = (&self.start_date, &self.end_date) {
            builder = builder.with_window(start, end);
        }
        builder
    }

    /// Search pacing
    pub fn governor(&self) -> Result<RateGovernor, CliError> {
        Ok(RateGovernor::per_minute(self.search_rate)?)
    }

    /// Pipeline configured from these flags
    pub fn pipeline(&self, cli: &Cli) -> ReportPipeline {
        ReportPipeline::new()
            .with_workers(self.max_workers)
            .with_auto_optimize(self.auto_optimize_workers)
            .with_progress(cli.show_progress())
    }
}

/// Flags common to batched cleanup commands
#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Parallel workers
    #[arg(long, default_value_t = DEFAULT_CLEANUP_WORKERS, value_parser = parse_workers)]
    pub max_workers: usize,

    /// Items submitted per chunk
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE as u32, value_parser = parse_positive)]
    pub batch_size: u32,
}

impl BatchArgs {
    /// Executor for `total` items, with a progress bar when the terminal allows it
    pub fn executor(&self, label: &str, total: usize, cli: &Cli) -> Result<ParallelExecutor, CliError> {
        let mut executor =
            ParallelExecutor::new(self.max_workers, self.batch_size as usize)?.with_label(label);
        if cli.show_progress() && total > 0 {
            executor = executor.with_progress(progress_bar(total as u64, label));
        }
        Ok(executor)
    }
}

/// Print a finished report
pub(crate) fn print_report(
    format: OutputFormat,
    command: &str,
    summary: &ReportSummary,
) -> Result<(), CliError> {
    super::print_result(format, command, summary, |summary| {
        println!("\n{command} completed successfully!");
        match &summary.output_path {
            Some(path) => println!("Output: {}", path.display()),
            None => println!("Output: none (no rows found)"),
        }
        println!("Rows: {}", summary.rows);
        println!("Date ranges: {}", summary.ranges);
        if summary.failed_ranges > 0 {
            println!("Failed date ranges: {}", summary.failed_ranges);
        }
        println!("Workers: {}", summary.workers);
        if summary.status_checked {
            println!("Status check: done");
        }
        println!("Duration: {}", summary.duration);
    })
}
