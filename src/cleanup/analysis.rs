//! Published photo usage analysis
//!
//! Candidates are checked in three passes, each over the photos still unclaimed:
//!
//! 1. content references with at least one published reference
//! 2. full-text gallery search, per website
//! 3. lightbox membership from the local cache
//!
//! Claimed photos are written to the preserved file; what is left is the delete list.
//! Photos whose check failed are held back from both files.

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, info_span, warn};

use super::CleanupResult;
use crate::api::{ApiResult, PhotoApi, PhotoFilter};
use crate::cache::{CacheResult, PresenceCache};
use crate::output::{CsvRecord, CsvSink, PhotoReportPaths};
use crate::processor::config::{ITEM_OPTIMIZER_CANDIDATES, ITEM_OPTIMIZER_SAMPLE};
use crate::processor::{optimize_worker_count, BatchOutcome, ParallelExecutor};

/// A photo that must be kept, and where it is used
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreservedPhoto {
    /// Photo id
    pub ans_id: String,
    /// `referenced-content {types}`, `gallery` or `lightbox`
    pub ans_location: String,
    /// Photo source filter of the run, if any
    pub source_id: String,
    /// Website(s) the usage was found on
    pub website: String,
}

impl CsvRecord for PreservedPhoto {
    fn header(&self) -> Vec<String> {
        ["ans_id", "ans_location", "source_id", "website"]
            .iter()
            .map(|h| h.to_string())
            .collect()
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.ans_id.clone(),
            self.ans_location.clone(),
            self.source_id.clone(),
            self.website.clone(),
        ]
    }
}

/// Which photos to analyze
#[derive(Debug, Clone)]
pub enum PhotoCandidates {
    /// One photo by id
    Single(String),
    /// Published photos matching a filter, starting at an offset
    Listing {
        /// Listing filter
        filter: PhotoFilter,
        /// First listing offset
        offset: u64,
    },
}

/// Result of the three passes
#[derive(Debug, Clone, Default)]
pub struct AnalysisOutcome {
    /// Unused photos, in listing order
    pub to_delete: Vec<String>,
    /// Photos in use
    pub preserved: Vec<PreservedPhoto>,
    /// Photos whose check failed
    pub unresolved: Vec<String>,
    /// Preserved by published references
    pub in_references: usize,
    /// Preserved by gallery search
    pub in_galleries: usize,
    /// Preserved by lightbox membership
    pub in_lightboxes: usize,
}

/// Counts and files of one analysis run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    /// Photos analyzed
    pub candidates: usize,
    /// Photos listed for deletion
    pub to_delete: usize,
    /// Photos preserved
    pub preserved: usize,
    /// Preserved by published references
    pub in_references: usize,
    /// Preserved by gallery search
    pub in_galleries: usize,
    /// Preserved by lightbox membership
    pub in_lightboxes: usize,
    /// Photos whose check failed
    pub unresolved: usize,
    /// Delete list file, when written
    pub to_delete_path: Option<PathBuf>,
    /// Preserved file, when written
    pub preserved_path: Option<PathBuf>,
}

/// Photo usage analysis bound to one organization
pub struct PhotoAnalysis {
    photos: PhotoApi,
    executor: ParallelExecutor,
    websites: Vec<String>,
    lightboxes: Option<Arc<dyn PresenceCache>>,
    source_id: String,
    auto_optimize: bool,
}

impl PhotoAnalysis {
    /// Analysis using `photos` for every remote check
    pub fn new(photos: PhotoApi, executor: ParallelExecutor) -> Self {
        Self {
            photos,
            executor,
            websites: Vec::new(),
            lightboxes: None,
            source_id: String::new(),
            auto_optimize: false,
        }
    }

    /// Profile worker counts with reference lookups on the first photos
    pub fn with_auto_optimize(mut self, enabled: bool) -> Self {
        self.auto_optimize = enabled;
        self
    }

    /// Websites searched for galleries; no gallery pass without any
    pub fn with_websites(mut self, websites: Vec<String>) -> Self {
        self.websites = websites;
        self
    }

    /// Lightbox presence cache; no lightbox pass without one
    pub fn with_lightbox_cache(mut self, cache: Arc<dyn PresenceCache>) -> Self {
        self.lightboxes = Some(cache);
        self
    }

    /// Source id recorded on preserved rows
    pub fn with_source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = source_id.into();
        self
    }

    /// Resolve candidate photo ids
    ///
    /// A single id is confirmed with a fetch of the photo document first.
    pub fn candidates(&self, candidates: &PhotoCandidates) -> CleanupResult<Vec<String>> {
        match candidates {
            PhotoCandidates::Single(id) => {
                self.photos.get_photo(id)?;
                info!(photo = %id, "Retrieved single photo");
                Ok(vec![id.clone()])
            }
            PhotoCandidates::Listing { filter, offset } => {
                let ids = self.photos.list_published(filter, *offset)?;
                info!(photos = ids.len(), "Listed candidate photos");
                Ok(ids)
            }
        }
    }

    /// Run the three passes over `ids`
    pub fn analyze(&self, ids: Vec<String>) -> AnalysisOutcome {
        let span = info_span!("photo_analysis", photos = ids.len());
        let _guard = span.enter();

        let mut outcome = AnalysisOutcome::default();
        let mut claimed: HashSet<String> = HashSet::new();
        let mut remaining = ids;

        let tuned = self.tuned_executor(&remaining);
        let executor = tuned.as_ref().unwrap_or(&self.executor);

        info!("Step 1: Checking photo references");
        let pass = executor.process(&remaining, |id: &String| -> ApiResult<Option<PreservedPhoto>> {
            let references = self.photos.references(id)?;
            Ok(references.any_published.then(|| PreservedPhoto {
                ans_id: id.clone(),
                ans_location: format!("referenced-content {}", set_label(&references.reference_types)),
                source_id: self.source_id.clone(),
                website: set_label(&references.websites),
            }))
        });
        outcome.in_references = pass.results.len();
        remaining = settle_pass(pass, &mut outcome, &mut claimed, remaining);
        info!(preserved = outcome.in_references, "Reference check complete");

        if !remaining.is_empty() && !self.websites.is_empty() {
            info!("Step 2: Checking gallery usage");
            let pass = executor.process(&remaining, |id: &String| -> ApiResult<Option<PreservedPhoto>> {
                for website in &self.websites {
                    if self.photos.used_in_gallery(website, id)? {
                        return Ok(Some(PreservedPhoto {
                            ans_id: id.clone(),
                            ans_location: "gallery".to_string(),
                            source_id: self.source_id.clone(),
                            website: website.clone(),
                        }));
                    }
                }
                Ok(None)
            });
            outcome.in_galleries = pass.results.len();
            remaining = settle_pass(pass, &mut outcome, &mut claimed, remaining);
            info!(preserved = outcome.in_galleries, "Gallery check complete");
        }

        if let Some(cache) = self.lightboxes.as_ref().filter(|_| !remaining.is_empty()) {
            info!("Step 3: Checking lightbox usage");
            let pass = executor.process(&remaining, |id: &String| -> CacheResult<Option<PreservedPhoto>> {
                Ok(cache.exists(id)?.then(|| PreservedPhoto {
                    ans_id: id.clone(),
                    ans_location: "lightbox".to_string(),
                    source_id: self.source_id.clone(),
                    website: String::new(),
                }))
            });
            outcome.in_lightboxes = pass.results.len();
            remaining = settle_pass(pass, &mut outcome, &mut claimed, remaining);
            info!(preserved = outcome.in_lightboxes, "Lightbox check complete");
        }

        outcome.to_delete = remaining;
        if !outcome.unresolved.is_empty() {
            warn!(
                unresolved = outcome.unresolved.len(),
                "Some photos could not be checked and are in neither output file"
            );
        }
        info!(
            to_delete = outcome.to_delete.len(),
            preserved = outcome.preserved.len(),
            "Analysis processing complete"
        );
        outcome
    }

    // Reference lookups are read-only, so the sample can run once per candidate.
    fn tuned_executor(&self, ids: &[String]) -> Option<ParallelExecutor> {
        if !self.auto_optimize || ids.len() <= ITEM_OPTIMIZER_SAMPLE {
            return None;
        }
        let report = optimize_worker_count(
            &ids[..ITEM_OPTIMIZER_SAMPLE],
            ITEM_OPTIMIZER_CANDIDATES,
            self.executor.chunk_size(),
            self.executor.max_workers(),
            |id: &String| self.photos.references(id).map(Some),
        );
        if report.workers == self.executor.max_workers() {
            return None;
        }
        match ParallelExecutor::new(report.workers, self.executor.chunk_size()) {
            Ok(executor) => Some(executor.with_label("photos")),
            Err(e) => {
                warn!(error = %e, "Keeping configured worker count");
                None
            }
        }
    }

    /// List, analyze and write both output files
    pub fn run(
        &self,
        candidates: &PhotoCandidates,
        paths: &PhotoReportPaths,
    ) -> CleanupResult<AnalysisSummary> {
        let ids = self.candidates(candidates)?;
        let total = ids.len();
        if ids.is_empty() {
            warn!("No photos to process");
        }

        let outcome = self.analyze(ids);
        let (to_delete_path, preserved_path) = write_analysis(&outcome, paths)?;

        Ok(AnalysisSummary {
            candidates: total,
            to_delete: outcome.to_delete.len(),
            preserved: outcome.preserved.len(),
            in_references: outcome.in_references,
            in_galleries: outcome.in_galleries,
            in_lightboxes: outcome.in_lightboxes,
            unresolved: outcome.unresolved.len(),
            to_delete_path,
            preserved_path,
        })
    }
}

/// Append both outputs; files that end up empty are removed
pub fn write_analysis(
    outcome: &AnalysisOutcome,
    paths: &PhotoReportPaths,
) -> CleanupResult<(Option<PathBuf>, Option<PathBuf>)> {
    let mut preserved = CsvSink::append(&paths.preserved)?;
    preserved.write_all(&outcome.preserved)?;
    let preserved_path = preserved.finish()?;

    let mut to_delete = CsvSink::append(&paths.to_delete)?.without_header();
    to_delete.write_all(&outcome.to_delete)?;
    let to_delete_path = to_delete.finish()?;

    for (label, path, rows) in [
        ("preserved photos", &preserved_path, outcome.preserved.len()),
        ("photo ids to delete", &to_delete_path, outcome.to_delete.len()),
    ] {
        match path {
            Some(path) => info!(rows, path = %path.display(), "Wrote {}", label),
            None => info!("No {} to write", label),
        }
    }
    Ok((to_delete_path, preserved_path))
}

// Moves claimed and failed ids out of `remaining`, keeping listing order.
fn settle_pass(
    pass: BatchOutcome<PreservedPhoto>,
    outcome: &mut AnalysisOutcome,
    claimed: &mut HashSet<String>,
    remaining: Vec<String>,
) -> Vec<String> {
    for failure in pass.failures {
        claimed.insert(failure.item.clone());
        outcome.unresolved.push(failure.item);
    }
    for preserved in pass.results {
        claimed.insert(preserved.ans_id.clone());
        outcome.preserved.push(preserved);
    }
    remaining.into_iter().filter(|id| !claimed.contains(id)).collect()
}

fn set_label(values: &BTreeSet<String>) -> String {
    let joined: Vec<&str> = values.iter().map(String::as_str).collect();
    format!("{{{}}}", joined.join(", "))
}
