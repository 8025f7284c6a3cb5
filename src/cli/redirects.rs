//! `redirects report` and `redirects delete`

use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use super::args::{print_report, BatchArgs, ReportArgs};
use super::validate::{parse_positive, single_or_file, Source};
use super::{print_cleanup, Cli, CliError};
use crate::api::{ArcEnvironment, ContentSearch, DraftApi};
use crate::cleanup::{read_redirect_targets, run_cleanup, RedirectDeletion, RedirectTarget};
use crate::processor::config::{
    DEFAULT_DRAFT_RATE_PER_SECOND, DEFAULT_STATUS_BATCH_SIZE, DEFAULT_STATUS_CONCURRENCY,
    DEFAULT_STATUS_TIMEOUT_SECS,
};
use crate::processor::{RateGovernor, RunStatistics};
use crate::report::{RedirectReport, StatusCheckRequest};
use crate::status::StatusCheckConfig;

/// Redirects subcommand
#[derive(Args, Debug)]
pub struct RedirectsCommand {
    /// Action to run
    #[command(subcommand)]
    pub action: RedirectsAction,
}

/// Redirect actions
#[derive(Subcommand, Debug)]
pub enum RedirectsAction {
    /// Export redirects to CSV, optionally checking each canonical URL
    Report(RedirectReportArgs),
    /// Delete redirects
    Delete(RedirectDeleteArgs),
}

/// Arguments for the redirect report
#[derive(Args, Debug)]
pub struct RedirectReportArgs {
    /// Common report flags
    #[command(flatten)]
    pub report: ReportArgs,

    /// Public domain used to check canonical URLs (e.g. https://www.example.com)
    #[arg(long)]
    pub website_domain: Option<String>,

    /// Check every canonical URL and record its HTTP status
    #[arg(long, default_value_t = false)]
    pub do_404_or_200: bool,

    /// Status checks in flight at once
    #[arg(long, default_value_t = DEFAULT_STATUS_CONCURRENCY as u32, value_parser = parse_positive)]
    pub status_concurrency: u32,

    /// Per-URL status check timeout in seconds
    #[arg(long, default_value_t = DEFAULT_STATUS_TIMEOUT_SECS as u32, value_parser = parse_positive)]
    pub status_timeout: u32,
}

/// Arguments for redirect deletion
#[derive(Args, Debug)]
pub struct RedirectDeleteArgs {
    /// Single redirect URL to delete
    #[arg(long, requires = "redirect_website")]
    pub redirect_url: Option<String>,

    /// Website of the single redirect
    #[arg(long, requires = "redirect_url")]
    pub redirect_website: Option<String>,

    /// CSV of `url,website` rows, no header
    #[arg(long)]
    pub redirects_csv: Option<PathBuf>,

    /// Batch flags
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Deletes per second
    #[arg(long, default_value_t = DEFAULT_DRAFT_RATE_PER_SECOND, value_parser = parse_positive)]
    pub rate: u32,

    /// Log what would be deleted without calling the API
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

impl RedirectsCommand {
    /// Execute the selected redirect action
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        match &self.action {
            RedirectsAction::Report(args) => args.execute(cli),
            RedirectsAction::Delete(args) => args.execute(cli),
        }
    }
}

impl RedirectReportArgs {
    fn status_check(&self) -> Result<Option<StatusCheckRequest>, CliError> {
        if !self.do_404_or_200 {
            return Ok(None);
        }
        let domain = self
            .website_domain
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| {
                CliError::InvalidArgument("--do-404-or-200 requires --website-domain".to_string())
            })?;
        let config = StatusCheckConfig {
            concurrency: self.status_concurrency as usize,
            batch_size: DEFAULT_STATUS_BATCH_SIZE,
            timeout: Duration::from_secs(u64::from(self.status_timeout)),
        };
        config.validate()?;
        Ok(Some(StatusCheckRequest {
            domain: domain.to_string(),
            config,
        }))
    }

    /// Build and export the redirect report
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let window = self.report.window()?;
        let status_check = self.status_check()?;
        let output_path = self.report.path_builder().build()?;
        let ctx = cli.context(ArcEnvironment::Production)?;

        info!(
            org = %ctx.org,
            environment = %ctx.environment,
            website = %self.report.website,
            "Generating redirect report"
        );
        let client = ctx.client(self.report.governor()?)?;
        let source = RedirectReport::new(
            ContentSearch::new(client, self.report.website.as_str()),
            ctx.environment,
        );

        let mut pipeline = self.report.pipeline(cli);
        if let Some(request) = status_check {
            pipeline = pipeline.with_status_check(request);
        }
        let summary = pipeline.run(&source, window.as_ref(), &output_path)?;
        print_report(cli.output_format, "redirects report", &summary)
    }
}

impl RedirectDeleteArgs {
    fn targets(&self) -> Result<Vec<RedirectTarget>, CliError> {
        let single = self
            .redirect_url
            .as_ref()
            .zip(self.redirect_website.as_ref())
            .map(|(url, website)| RedirectTarget {
                url: url.clone(),
                website: website.clone(),
            });
        match single_or_file(single, self.redirects_csv.as_ref(), "--redirect-url", "--redirects-csv")? {
            Source::Single(target) => Ok(vec![target]),
            Source::File(path) => Ok(read_redirect_targets(path)?),
        }
    }

    /// Delete every requested redirect
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let targets = self.targets()?;
        let ctx = cli.context(ArcEnvironment::Sandbox)?;
        if targets.is_empty() {
            warn!("No redirects to delete");
        }
        info!(
            org = %ctx.org,
            environment = %ctx.environment,
            redirects = targets.len(),
            "Deleting redirects"
        );

        let client = ctx.client(RateGovernor::per_second(self.rate)?)?;
        let action = RedirectDeletion::new(DraftApi::new(client));
        let executor = self.batch.executor("redirects", targets.len(), cli)?;
        let statistics = RunStatistics::new();
        let report = run_cleanup(&action, &targets, &executor, self.dry_run, &statistics);
        print_cleanup(cli.output_format, "redirects delete", &report)
    }
}
