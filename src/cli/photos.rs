//! `photos analyze`, `photos delete` and `photos lightbox-cache`

use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use super::args::BatchArgs;
use super::validate::{parse_epoch_ms, parse_positive, resolve_epoch_window, single_or_file, Source};
use super::{print_cleanup, print_result, ApiContext, Cli, CliError};
use crate::api::{ArcEnvironment, PhotoApi, PhotoFilter};
use crate::cache::{CacheBuildSummary, LightboxCache, LightboxCacheBuilder};
use crate::cleanup::{
    filter_preserved, preserved_ids_for, read_ids, run_cleanup, AnalysisSummary, PhotoAnalysis,
    PhotoCandidates, PhotoRemoval, RemovalMode,
};
use crate::output::PhotoReportPaths;
use crate::processor::config::{DEFAULT_PHOTO_RATE_PER_SECOND, DEFAULT_REPORT_FOLDER};
use crate::processor::{RateGovernor, RunStatistics};

/// Photos subcommand
#[derive(Args, Debug)]
pub struct PhotosCommand {
    /// Action to run
    #[command(subcommand)]
    pub action: PhotosAction,
}

/// Photo actions
#[derive(Subcommand, Debug)]
pub enum PhotosAction {
    /// Split published photos into a delete list and a preserved list
    Analyze(PhotoAnalyzeArgs),
    /// Expire (default) or hard-delete photos
    Delete(PhotoDeleteArgs),
    /// Build or refresh the local lightbox membership cache
    LightboxCache(LightboxCacheArgs),
}

/// Arguments for photo analysis
#[derive(Args, Debug)]
pub struct PhotoAnalyzeArgs {
    /// Analyze one photo instead of the published listing
    #[arg(long, conflicts_with_all = ["start_date", "end_date", "offset", "source", "pc_published_wires"])]
    pub image_arc_id: Option<String>,

    /// Upload window start, epoch milliseconds
    #[arg(long, value_parser = parse_epoch_ms)]
    pub start_date: Option<i64>,

    /// Upload window end, epoch milliseconds
    #[arg(long, value_parser = parse_epoch_ms)]
    pub end_date: Option<i64>,

    /// First listing offset
    #[arg(long, default_value_t = 0)]
    pub offset: u64,

    /// Restrict the listing to one photo source
    #[arg(long)]
    pub source: Option<String>,

    /// Websites searched for gallery usage, comma separated
    #[arg(long, value_delimiter = ',')]
    pub website_list: Vec<String>,

    /// Restrict the listing to published wire photos
    #[arg(long, default_value_t = false)]
    pub pc_published_wires: bool,

    /// Batch flags
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Photo API calls per second
    #[arg(long, default_value_t = DEFAULT_PHOTO_RATE_PER_SECOND, value_parser = parse_positive)]
    pub rate: u32,

    /// Folder receiving both output files and holding the lightbox cache
    #[arg(long, default_value = DEFAULT_REPORT_FOLDER)]
    pub report_folder: PathBuf,

    /// Lightbox cache file (defaults to the conventional name in the report folder)
    #[arg(long)]
    pub lightbox_cache: Option<PathBuf>,

    /// Profile a few worker counts on the first photos and keep the fastest
    #[arg(long, default_value_t = false)]
    pub auto_optimize_workers: bool,
}

/// Arguments for photo removal
#[derive(Args, Debug)]
pub struct PhotoDeleteArgs {
    /// Single photo id
    #[arg(long)]
    pub image_arc_id: Option<String>,

    /// CSV whose first column holds photo ids, no header
    ///
    /// For a `photo_ids_to_delete_` file, ids listed in the sibling
    /// `preserved_photo_ids_` file are skipped.
    #[arg(long)]
    pub images_csv: Option<PathBuf>,

    /// Delete photos instead of expiring them
    #[arg(long, default_value_t = false)]
    pub hard_delete: bool,

    /// Batch flags
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Photo API calls per second
    #[arg(long, default_value_t = DEFAULT_PHOTO_RATE_PER_SECOND, value_parser = parse_positive)]
    pub rate: u32,

    /// Log what would be changed without calling the API
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

/// Arguments for the lightbox cache build
#[derive(Args, Debug)]
pub struct LightboxCacheArgs {
    /// Refresh one lightbox only
    #[arg(long, conflicts_with = "offset")]
    pub lightbox_id: Option<String>,

    /// Listing offset to start from (defaults to where the last build stopped)
    #[arg(long)]
    pub offset: Option<u64>,

    /// Batch flags
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Photo API calls per second
    #[arg(long, default_value_t = DEFAULT_PHOTO_RATE_PER_SECOND, value_parser = parse_positive)]
    pub rate: u32,

    /// Folder holding the cache file
    #[arg(long, default_value = DEFAULT_REPORT_FOLDER)]
    pub report_folder: PathBuf,

    /// Cache file (defaults to the conventional name in the report folder)
    #[arg(long)]
    pub lightbox_cache: Option<PathBuf>,
}

impl PhotosCommand {
    /// Execute the selected photo action
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        match &self.action {
            PhotosAction::Analyze(args) => args.execute(cli),
            PhotosAction::Delete(args) => args.execute(cli),
            PhotosAction::LightboxCache(args) => args.execute(cli),
        }
    }
}

fn cache_path(explicit: Option<&PathBuf>, folder: &Path, ctx: &ApiContext) -> PathBuf {
    explicit
        .cloned()
        .unwrap_or_else(|| LightboxCache::default_path(folder, &ctx.org, ctx.is_sandbox()))
}

fn photo_api(ctx: &ApiContext, rate: u32) -> Result<PhotoApi, CliError> {
    Ok(PhotoApi::new(ctx.client(RateGovernor::per_second(rate)?)?))
}

impl PhotoAnalyzeArgs {
    fn candidates(&self, window: Option<(i64, i64)>) -> PhotoCandidates {
        match &self.image_arc_id {
            Some(id) => PhotoCandidates::Single(id.clone()),
            None => PhotoCandidates::Listing {
                filter: PhotoFilter {
                    uploaded_between: window,
                    source: self.source.clone(),
                    published_wires: self.pc_published_wires,
                },
                offset: self.offset,
            },
        }
    }

    fn websites(&self) -> Vec<String> {
        self.website_list
            .iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect()
    }

    /// Analyze photo usage and write the delete and preserved lists
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let window = resolve_epoch_window(self.start_date, self.end_date)?;
        let ctx = cli.context(ArcEnvironment::Sandbox)?;
        let single_date = self
            .image_arc_id
            .as_ref()
            .map(|_| chrono::Local::now().date_naive());
        let paths = PhotoReportPaths::new(
            &self.report_folder,
            &ctx.org,
            ctx.is_sandbox(),
            window,
            single_date,
        );

        let websites = self.websites();
        if websites.is_empty() {
            warn!("No --website-list given; gallery usage will not be checked");
        }

        let executor = self.batch.executor("photos", 0, cli)?;
        let mut analysis = PhotoAnalysis::new(photo_api(&ctx, self.rate)?, executor)
            .with_websites(websites)
            .with_auto_optimize(self.auto_optimize_workers)
            .with_source_id(self.source.clone().unwrap_or_default());

        let cache_path = cache_path(self.lightbox_cache.as_ref(), &self.report_folder, &ctx);
        if cache_path.is_file() {
            let cache = LightboxCache::load(&cache_path)?;
            info!(
                path = %cache_path.display(),
                photos = cache.photo_count(),
                complete = cache.is_complete(),
                "Loaded lightbox cache"
            );
            if !cache.is_complete() {
                warn!("Lightbox cache is incomplete; run `photos lightbox-cache` to finish it");
            }
            analysis = analysis.with_lightbox_cache(Arc::new(cache));
        } else {
            warn!(
                path = %cache_path.display(),
                "Lightbox cache not found; lightbox usage will not be checked"
            );
        }

        info!(
            org = %ctx.org,
            environment = %ctx.environment,
            "Analyzing photo usage"
        );
        let summary = analysis.run(&self.candidates(window), &paths)?;
        print_analysis(cli, &summary)
    }
}

impl PhotoDeleteArgs {
    /// Ids to process and ids skipped because they are preserved
    fn ids(&self) -> Result<(Vec<String>, Vec<String>), CliError> {
        match single_or_file(self.image_arc_id.clone(), self.images_csv.as_ref(), "--image-arc-id", "--images-csv")? {
            Source::Single(id) => Ok((vec![id], Vec::new())),
            Source::File(path) => {
                let ids = read_ids(path)?;
                let preserved = preserved_ids_for(path);
                Ok(filter_preserved(ids, &preserved))
            }
        }
    }

    /// Expire or delete every requested photo
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let (ids, skipped) = self.ids()?;
        let ctx = cli.context(ArcEnvironment::Sandbox)?;
        let mode = if self.hard_delete {
            RemovalMode::HardDelete
        } else {
            RemovalMode::Expire
        };

        let statistics = RunStatistics::new();
        if !skipped.is_empty() {
            info!(skipped = skipped.len(), "Skipping preserved photos");
            statistics.add_skipped(skipped.len() as u64);
        }
        if ids.is_empty() {
            warn!("No photos to process");
        }
        info!(
            org = %ctx.org,
            environment = %ctx.environment,
            photos = ids.len(),
            mode = ?mode,
            "Removing photos"
        );

        let action = PhotoRemoval::new(photo_api(&ctx, self.rate)?, mode);
        let executor = self.batch.executor("photos", ids.len(), cli)?;
        let report = run_cleanup(&action, &ids, &executor, self.dry_run, &statistics);
        print_cleanup(cli.output_format, "photos delete", &report)
    }
}

impl LightboxCacheArgs {
    /// Build the whole cache, or refresh one lightbox
    pub fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let ctx = cli.context(ArcEnvironment::Sandbox)?;
        let path = cache_path(self.lightbox_cache.as_ref(), &self.report_folder, &ctx);
        info!(
            org = %ctx.org,
            environment = %ctx.environment,
            path = %path.display(),
            "Building lightbox cache"
        );

        let executor = self.batch.executor("lightboxes", 0, cli)?;
        let builder = LightboxCacheBuilder::new(photo_api(&ctx, self.rate)?, executor, path);
        let summary = match &self.lightbox_id {
            Some(id) => builder.build_one(id)?,
            None => builder.build_all(self.offset)?,
        };
        print_cache_build(cli, &summary)
    }
}

fn print_analysis(cli: &Cli, summary: &AnalysisSummary) -> Result<(), CliError> {
    print_result(cli.output_format, "photos analyze", summary, |summary| {
        println!("\nphotos analyze completed successfully!");
        println!("Photos analyzed: {}", summary.candidates);
        println!("To delete: {}", summary.to_delete);
        println!(
            "Preserved: {} (references {}, galleries {}, lightboxes {})",
            summary.preserved, summary.in_references, summary.in_galleries, summary.in_lightboxes
        );
        if summary.unresolved > 0 {
            println!("Unresolved (in neither file): {}", summary.unresolved);
        }
        if let Some(path) = &summary.to_delete_path {
            println!("Delete list: {}", path.display());
        }
        if let Some(path) = &summary.preserved_path {
            println!("Preserved list: {}", path.display());
        }
    })
}

fn print_cache_build(cli: &Cli, summary: &CacheBuildSummary) -> Result<(), CliError> {
    print_result(cli.output_format, "photos lightbox-cache", summary, |summary| {
        println!("\nphotos lightbox-cache completed successfully!");
        println!("Cache: {}", summary.cache_path.display());
        println!("Pages: {}", summary.pages);
        println!("Lightboxes loaded: {}", summary.lightboxes_loaded);
        println!("Lightboxes unchanged: {}", summary.lightboxes_unchanged);
        println!("Photos recorded: {}", summary.photos_recorded);
        if !summary.empty_lightboxes.is_empty() {
            println!("Empty lightboxes: {}", summary.empty_lightboxes.len());
        }
        if !summary.failed_lightboxes.is_empty() {
            println!("Failed lightboxes: {}", summary.failed_lightboxes.join(", "));
        }
        println!("Complete: {}", if summary.complete { "yes" } else { "no" });
    })
}
