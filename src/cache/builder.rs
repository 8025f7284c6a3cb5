//! Fills a [`LightboxCache`] from the photo API
//!
//! The listing is walked page by page. Photos of the lightboxes on one page are
//! loaded in parallel, and the cache is saved after every page together with the
//! page offset, so an interrupted build picks up where it stopped.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, info_span, warn};

use super::lightbox::{fingerprint, LightboxCache};
use super::CacheResult;
use crate::api::PhotoApi;
use crate::processor::config::{PHOTO_MAX_PAGES, PHOTO_PAGE_SIZE};
use crate::processor::ParallelExecutor;

/// Outcome of one build
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheBuildSummary {
    /// Lightbox listing pages processed
    pub pages: u64,
    /// Lightboxes whose photos were (re)loaded
    pub lightboxes_loaded: u64,
    /// Lightboxes skipped because their fingerprint did not change
    pub lightboxes_unchanged: u64,
    /// Photos recorded during this build
    pub photos_recorded: u64,
    /// Lightboxes without photos
    pub empty_lightboxes: Vec<String>,
    /// Lightboxes whose photos could not be loaded
    pub failed_lightboxes: Vec<String>,
    /// Whether the listing reached its end
    pub complete: bool,
    /// Cache file written
    pub cache_path: PathBuf,
}

/// Builds or refreshes the lightbox cache file
pub struct LightboxCacheBuilder {
    photos: PhotoApi,
    executor: ParallelExecutor,
    cache_path: PathBuf,
}

impl LightboxCacheBuilder {
    /// Builder writing to `cache_path`
    pub fn new(photos: PhotoApi, executor: ParallelExecutor, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            photos,
            executor,
            cache_path: cache_path.into(),
        }
    }

    /// Cache file this builder writes
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Walk the whole lightbox listing
    ///
    /// Starts at `start_offset` when given, otherwise at the offset recorded by an
    /// unfinished previous build.
    pub fn build_all(&self, start_offset: Option<u64>) -> CacheResult<CacheBuildSummary> {
        let span = info_span!("lightbox_cache", path = %self.cache_path.display());
        let _guard = span.enter();

        let mut cache = LightboxCache::load_or_new(&self.cache_path)?;
        let mut offset = start_offset.unwrap_or_else(|| cache.last_offset());
        let mut summary = CacheBuildSummary {
            cache_path: self.cache_path.clone(),
            ..Default::default()
        };
        info!(offset, cached_photos = cache.photo_count(), "Loading lightboxes");

        loop {
            cache.set_last_offset(offset);

            let (page, total) = match self.photos.lightboxes_page(offset) {
                Ok(result) => result,
                Err(e) if summary.pages == 0 => return Err(e.into()),
                Err(e) => {
                    warn!(offset, error = %e, "Lightbox listing failed, cache kept for resume");
                    cache.save(&self.cache_path)?;
                    break;
                }
            };

            if page.is_empty() {
                info!("Done loading lightboxes");
                cache.mark_complete();
                cache.save(&self.cache_path)?;
                summary.complete = true;
                break;
            }

            let mut fingerprints = HashMap::with_capacity(page.len());
            let mut changed = Vec::with_capacity(page.len());
            for lightbox in &page {
                let print = fingerprint(lightbox.last_photo_added.as_ref());
                if cache.is_current(&lightbox.id, &print) {
                    summary.lightboxes_unchanged += 1;
                } else {
                    changed.push(lightbox.id.clone());
                }
                fingerprints.insert(lightbox.id.clone(), print);
            }

            let outcome = self.executor.process(&changed, |id: &String| {
                self.photos
                    .lightbox_photos(id)
                    .map(|photos| Some((id.clone(), photos)))
            });

            for (id, photos) in outcome.results {
                if photos.is_empty() {
                    summary.empty_lightboxes.push(id.clone());
                }
                summary.lightboxes_loaded += 1;
                summary.photos_recorded += photos.len() as u64;
                let print = fingerprints.remove(&id).unwrap_or_default();
                cache.record_lightbox(&id, print, Some(offset), &photos);
            }
            summary
                .failed_lightboxes
                .extend(outcome.failures.into_iter().map(|f| f.item));

            summary.pages += 1;
            offset += PHOTO_PAGE_SIZE;
            cache.set_last_offset(offset);
            cache.save(&self.cache_path)?;

            if total > 0 && offset >= total {
                info!(total, "Reached end of lightbox listing");
                cache.mark_complete();
                cache.save(&self.cache_path)?;
                summary.complete = true;
                break;
            }
            if summary.pages as usize >= PHOTO_MAX_PAGES {
                warn!(pages = summary.pages, "Reached maximum page limit, stopping");
                break;
            }
        }

        info!(
            pages = summary.pages,
            loaded = summary.lightboxes_loaded,
            unchanged = summary.lightboxes_unchanged,
            photos = summary.photos_recorded,
            empty = summary.empty_lightboxes.len(),
            failed = summary.failed_lightboxes.len(),
            "Lightbox cache build finished"
        );
        Ok(summary)
    }

    /// Load a single lightbox
    ///
    /// The single-lightbox endpoint has no `last_photo_added`, so the entry is stored
    /// without a fingerprint and the listing offset is left untouched.
    pub fn build_one(&self, lightbox_id: &str) -> CacheResult<CacheBuildSummary> {
        let mut cache = LightboxCache::load_or_new(&self.cache_path)?;
        let lightbox = self.photos.lightbox(lightbox_id)?;
        let photos = self.photos.lightbox_photos(&lightbox.id)?;

        let mut summary = CacheBuildSummary {
            cache_path: self.cache_path.clone(),
            lightboxes_loaded: 1,
            photos_recorded: photos.len() as u64,
            complete: true,
            ..Default::default()
        };
        if photos.is_empty() {
            summary.empty_lightboxes.push(lightbox.id.clone());
        }

        cache.record_lightbox(&lightbox.id, String::new(), None, &photos);
        cache.save(&self.cache_path)?;
        info!(lightbox = %lightbox.id, photos = photos.len(), "Loaded single lightbox");
        Ok(summary)
    }
}
