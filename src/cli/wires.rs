//! `wires report` and `wires delete`

use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use super::args::{print_report, BatchArgs, ReportArgs};
use super::validate::{parse_positive, single_or_file, Source};
use super::{print_cleanup, Cli, CliError};
use crate::api::{ArcEnvironment, ContentSearch, DraftApi};
use crate::cleanup::{read_ids, run_cleanup, StoryDeletion};
use crate::processor::config::{DEFAULT_DRAFT_RATE_PER_SECOND, STORY_UNPUBLISH_SETTLE};
use crate::processor::{RateGovernor, RunStatistics};
use crate::report::WireReport;

/// Wires subcommand
#[derive(Args, Debug)]
pub struct WiresCommand {
    /// Action to run
    #[command(subcommand)]
    pub action: WiresAction,
}

/// Wire story actions
#[derive(Subcommand, Debug)]
pub enum WiresAction {
    /// Export unpublished wire stories to CSV
    Report(WireReportArgs),
    /// Unpublish and delete wire stories
    Delete(WireDeleteArgs),
}

/// Arguments for the wire report
#[derive(Args, Debug)]
pub struct WireReportArgs {
    /// Common report flags
    #[command(flatten)]
    pub report: ReportArgs,

    /// Extra query clause appended to the search (e.g. "AND source.name:AP")
    #[arg(long, default_value = "")]
    pub q_extra_filters: String,

    /// Extra dotted-path fields to export, comma separated
    #[arg(long, value_delimiter = ',')]
    pub q_extra_fields: Vec<String>,
}

/// Arguments for wire story deletion
#[derive(Args, Debug)]
pub struct WireDeleteArgs {
    /// Single story id to delete
    #[arg(long)]
    pub arc_id: Option<String>,

    /// CSV whose first column holds story ids, no header
    #[arg(long)]
    pub wires_csv: Option<PathBuf>,

    /// Batch flags
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Draft API calls per second
    #[arg(long, default_value_t = DEFAULT_DRAFT_RATE_PER_SECOND, value_parser = parse_positive)]
    pub rate: u32,

    /// Seconds to wait between unpublish and delete
    #[arg(long, default_value_t = STORY_UNPUBLISH_SETTLE.as_secs())]
    pub settle_secs: u64,

    /// Log what would be deleted without calling the API
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

impl WiresCommand {
    /// Execute the selected wire action
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        match &self.action {
            WiresAction::Report(args) => args.execute(cli),
            WiresAction::Delete(args) => args.execute(cli),
        }
    }
}

impl WireReportArgs {
    /// Build and export the wire report
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let window = self.report.window()?;
        let filters = self.q_extra_filters.trim();
        let mut path_builder = self.report.path_builder();
        if !filters.is_empty() {
            path_builder = path_builder.with_filters(filters);
        }
        let output_path = path_builder.build()?;
        let ctx = cli.context(ArcEnvironment::Production)?;

        info!(
            org = %ctx.org,
            environment = %ctx.environment,
            website = %self.report.website,
            filters,
            "Generating wire report"
        );
        let client = ctx.client(self.report.governor()?)?;
        let source = WireReport::new(
            ContentSearch::new(client, self.report.website.as_str()),
            ctx.environment,
        )
        .with_extra_filters(filters)
        .with_extra_fields(self.q_extra_fields.clone());

        let summary = self
            .report
            .pipeline(cli)
            .run(&source, window.as_ref(), &output_path)?;
        print_report(cli.output_format, "wires report", &summary)
    }
}

impl WireDeleteArgs {
    fn ids(&self) -> Result<Vec<String>, CliError> {
        match single_or_file(self.arc_id.clone(), self.wires_csv.as_ref(), "--arc-id", "--wires-csv")? {
            Source::Single(id) => Ok(vec![id]),
            Source::File(path) => Ok(read_ids(path)?),
        }
    }

    /// Unpublish and delete every requested story
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let ids = self.ids()?;
        let ctx = cli.context(ArcEnvironment::Sandbox)?;
        if ids.is_empty() {
            warn!("No wire stories to delete");
        }
        info!(
            org = %ctx.org,
            environment = %ctx.environment,
            stories = ids.len(),
            "Deleting wire stories"
        );

        let client = ctx.client(RateGovernor::per_second(self.rate)?)?;
        let action = StoryDeletion::new(DraftApi::new(client))
            .with_settle(Duration::from_secs(self.settle_secs));
        let executor = self.batch.executor("stories", ids.len(), cli)?;
        let statistics = RunStatistics::new();
        let report = run_cleanup(&action, &ids, &executor, self.dry_run, &statistics);
        print_cleanup(cli.output_format, "wires delete", &report)
    }
}
