//! CLI command implementations
//!
//! ```text
//! content-audit [global flags] redirects report | redirects delete
//!                              wires report     | wires delete
//!                              photos analyze   | photos delete | photos lightbox-cache
//! ```
//!
//! Reports default to the production environment; deletes and photo commands default
//! to sandbox unless `--environment` says otherwise.

pub mod args;
pub mod error;
pub mod photos;
pub mod redirects;
pub mod validate;
pub mod wires;

pub use args::{BatchArgs, ReportArgs};
pub use error::CliError;
pub use photos::{PhotosAction, PhotosCommand};
pub use redirects::{RedirectsAction, RedirectsCommand};
pub use wires::{WiresAction, WiresCommand};

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::IsTerminal;
use std::str::FromStr;
use std::sync::Arc;

use crate::api::{ApiClient, ArcEnvironment};
use crate::cleanup::CleanupReport;
use crate::processor::RateGovernor;

/// Content audit CLI
#[derive(Parser, Debug)]
#[command(name = "content-audit")]
#[command(about = "Report on and bulk-clean redirects, wire stories and photos", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json or human)
    #[arg(long, global = true, default_value = "human")]
    pub output_format: OutputFormat,

    /// Organization id
    #[arg(long, global = true)]
    pub org: Option<String>,

    /// Target environment (reports default to production, everything else to sandbox)
    #[arg(long, global = true, value_enum)]
    pub environment: Option<ArcEnvironment>,

    /// API bearer token
    #[arg(long, global = true, env = "ARC_BEARER_TOKEN", hide_env_values = true)]
    pub bearer_token: Option<String>,

    /// Override the API base URL
    #[arg(long, global = true, hide = true, env = "CONTENT_AUDIT_API_BASE_URL")]
    pub api_base_url: Option<String>,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report on or delete redirects
    Redirects(RedirectsCommand),

    /// Report on or delete unpublished wire stories
    Wires(WiresCommand),

    /// Analyze photo usage, expire or delete photos, build the lightbox cache
    Photos(PhotosCommand),
}

impl Cli {
    /// Run the selected command
    pub fn execute(&self) -> Result<(), CliError> {
        match &self.command {
            Commands::Redirects(command) => command.execute(self),
            Commands::Wires(command) => command.execute(self),
            Commands::Photos(command) => command.execute(self),
        }
    }

    /// Resolve org, environment, base URL and token
    ///
    /// Fails before any remote call when something is missing.
    pub fn context(&self, default_environment: ArcEnvironment) -> Result<ApiContext, CliError> {
        let org = self
            .org
            .as_deref()
            .map(str::trim)
            .filter(|org| !org.is_empty())
            .ok_or_else(|| CliError::ConfigurationError("--org is required".to_string()))?;
        if org.contains(|c: char| c.is_whitespace() || c == '/') {
            return Err(CliError::InvalidArgument(format!("invalid org id: {org}")));
        }

        let bearer_token = self
            .bearer_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                CliError::ConfigurationError(
                    "a bearer token is required (--bearer-token or ARC_BEARER_TOKEN)".to_string(),
                )
            })?;

        let environment = self.environment.unwrap_or(default_environment);
        let base_url = self
            .api_base_url
            .clone()
            .unwrap_or_else(|| environment.base_url(org));

        Ok(ApiContext {
            org: org.to_string(),
            environment,
            base_url,
            bearer_token: bearer_token.to_string(),
        })
    }

    /// Whether to draw progress bars
    pub fn show_progress(&self) -> bool {
        matches!(self.output_format, OutputFormat::Human) && std::io::stderr().is_terminal()
    }
}

/// Resolved connection settings for one run
#[derive(Clone)]
pub struct ApiContext {
    /// Organization id
    pub org: String,
    /// Target environment
    pub environment: ArcEnvironment,
    /// API base URL
    pub base_url: String,
    bearer_token: String,
}

impl std::fmt::Debug for ApiContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiContext")
            .field("org", &self.org)
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ApiContext {
    /// Whether this run targets the sandbox tenant
    pub fn is_sandbox(&self) -> bool {
        self.environment == ArcEnvironment::Sandbox
    }

    /// API client paced by `governor`
    pub fn client(&self, governor: RateGovernor) -> Result<Arc<ApiClient>, CliError> {
        let client = ApiClient::new(&self.base_url, &self.bearer_token)?
            .with_governor(Arc::new(governor));
        Ok(Arc::new(client))
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

// ─── Result printing ─────────────────────────────────────────────────────────

/// Print a command result as one JSON line, or through `human`
pub(crate) fn print_result<T: Serialize>(
    format: OutputFormat,
    command: &str,
    result: &T,
    human: impl FnOnce(&T),
) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "success": true,
                "command": command,
                "result": result,
            });
            println!("{}", serde_json::to_string(&output)?);
        }
        OutputFormat::Human => human(result),
    }
    Ok(())
}

/// Print end-of-run statistics of a cleanup
pub(crate) fn print_cleanup(
    format: OutputFormat,
    command: &str,
    report: &CleanupReport,
) -> Result<(), CliError> {
    print_result(format, command, report, |report| {
        let stats = &report.statistics;
        if report.dry_run {
            println!("\n[DRY RUN] {command} completed, no changes were made");
        } else {
            println!("\n{command} completed");
        }
        println!("Processed: {}", stats.processed);
        println!("Succeeded: {}", stats.succeeded);
        println!("Failed: {}", stats.failed);
        if stats.skipped > 0 {
            println!("Skipped: {}", stats.skipped);
        }
        println!("API calls: {}", stats.api_calls);
        println!("Success rate: {:.1}%", stats.success_rate);
        println!("Duration: {}", stats.duration);
        let failures: Vec<_> = report.failures().collect();
        if !failures.is_empty() {
            eprintln!("\nFailed items:");
            for failure in failures {
                eprintln!(
                    "  {} ({}): {}",
                    failure.identifier,
                    failure
                        .response_code
                        .map_or_else(|| failure.status.to_string(), |code| code.to_string()),
                    failure.error.as_deref().unwrap_or("")
                );
            }
        }
    })
}
