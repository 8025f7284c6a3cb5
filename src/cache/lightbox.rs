//! Lightbox membership cache document
//!
//! Saved as pretty JSON with an atomic temp-file rename under an advisory
//! `fd-lock` lock on a sibling `.lock` file.

use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{CacheError, CacheResult, PresenceCache};

/// Current cache schema version
const SCHEMA_VERSION: &str = "2.0.0";

/// Maximum accepted cache file size (256 MB)
pub const MAX_CACHE_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Fingerprint of a lightbox's `last_photo_added` value
///
/// Keys are sorted by `serde_json`'s map ordering, so equal values hash equally.
pub fn fingerprint(last_photo_added: Option<&Value>) -> String {
    let source = last_photo_added.cloned().unwrap_or(Value::Null).to_string();
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Cached state of one lightbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightboxEntry {
    /// Fingerprint of `last_photo_added`; empty when loaded individually
    pub fingerprint: String,
    /// Listing offset the lightbox was found at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    /// Number of photos recorded for it
    pub photo_count: usize,
    /// Last update, epoch milliseconds
    pub updated_at: i64,
}

/// Photo id → lightbox ids map plus listing progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightboxCache {
    schema_version: String,
    photos: BTreeMap<String, BTreeSet<String>>,
    lightboxes: BTreeMap<String, LightboxEntry>,
    last_offset: u64,
    complete: bool,
    updated_at: i64,
}

impl Default for LightboxCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LightboxCache {
    /// Empty cache
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            photos: BTreeMap::new(),
            lightboxes: BTreeMap::new(),
            last_offset: 0,
            complete: false,
            updated_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Conventional cache path: `{dir}/{org}_lightbox_photo_cache[_sandbox].json`
    pub fn default_path(dir: &Path, org: &str, sandbox: bool) -> PathBuf {
        let env = if sandbox { "_sandbox" } else { "" };
        dir.join(format!(
            "{}_lightbox_photo_cache{env}.json",
            crate::output::sanitize_component(org)
        ))
    }

    /// Lightboxes holding `photo_id`, sorted; empty when not cached
    pub fn lightboxes_of(&self, photo_id: &str) -> Vec<&str> {
        self.photos
            .get(photo_id)
            .map(|owners| owners.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Cached entry of one lightbox
    pub fn lightbox(&self, lightbox_id: &str) -> Option<&LightboxEntry> {
        self.lightboxes.get(lightbox_id)
    }

    /// Number of cached photos
    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }

    /// Number of cached lightboxes
    pub fn lightbox_count(&self) -> usize {
        self.lightboxes.len()
    }

    /// Offset of the last listing page that was started
    pub fn last_offset(&self) -> u64 {
        self.last_offset
    }

    /// Whether a full listing pass finished
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Whether the cached lightbox still matches `fingerprint`
    pub fn is_current(&self, lightbox_id: &str, fingerprint: &str) -> bool {
        !fingerprint.is_empty()
            && self
                .lightboxes
                .get(lightbox_id)
                .is_some_and(|entry| entry.fingerprint == fingerprint)
    }

    /// Record the listing offset about to be processed
    pub fn set_last_offset(&mut self, offset: u64) {
        self.last_offset = offset;
        self.complete = false;
        self.touch();
    }

    /// Mark the listing pass finished; the next build starts over at offset 0
    pub fn mark_complete(&mut self) {
        self.complete = true;
        self.last_offset = 0;
        self.touch();
    }

    /// Replace the photos recorded for one lightbox
    ///
    /// Only this lightbox's membership changes. A photo leaves the cache once no
    /// lightbox holds it.
    pub fn record_lightbox(
        &mut self,
        lightbox_id: &str,
        fingerprint: String,
        offset: Option<u64>,
        photo_ids: &[String],
    ) {
        self.photos.retain(|_, owners| {
            owners.remove(lightbox_id);
            !owners.is_empty()
        });
        for photo in photo_ids {
            self.photos
                .entry(photo.clone())
                .or_default()
                .insert(lightbox_id.to_string());
        }

        let now = chrono::Utc::now().timestamp_millis();
        self.lightboxes.insert(
            lightbox_id.to_string(),
            LightboxEntry {
                fingerprint,
                offset,
                photo_count: photo_ids.len(),
                updated_at: now,
            },
        );
        self.updated_at = now;
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }

    /// Load `path`, or start empty when it does not exist
    pub fn load_or_new(path: &Path) -> CacheResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "No lightbox cache yet, starting empty");
            Ok(Self::new())
        }
    }

    /// Save with an atomic rename while holding the write lock
    pub fn save(&self, path: &Path) -> CacheResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::IoError(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(lock_path(path))
            .map_err(|e| CacheError::LockError(format!("Failed to create lock file: {e}")))?;
        let mut lock = RwLock::new(lock_file);
        let _guard = lock
            .write()
            .map_err(|e| CacheError::LockError(format!("Failed to acquire write lock: {e}")))?;

        let parent_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir)
            .map_err(|e| CacheError::IoError(format!("Failed to create temp file: {e}")))?;
        temp_file
            .write_all(json.as_bytes())
            .map_err(|e| CacheError::IoError(format!("Failed to write temp file: {e}")))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| CacheError::IoError(format!("Failed to sync temp file: {e}")))?;
        temp_file
            .persist(path)
            .map_err(|e| CacheError::IoError(format!("Failed to persist temp file: {e}")))?;

        debug!(
            path = %path.display(),
            photos = self.photos.len(),
            lightboxes = self.lightboxes.len(),
            last_offset = self.last_offset,
            "Lightbox cache saved"
        );
        Ok(())
    }

    /// Load while holding the read lock
    pub fn load(path: &Path) -> CacheResult<Self> {
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(lock_path(path))
            .map_err(|e| CacheError::LockError(format!("Failed to create lock file: {e}")))?;
        let lock = RwLock::new(lock_file);
        let _guard = lock
            .read()
            .map_err(|e| CacheError::LockError(format!("Failed to acquire read lock: {e}")))?;

        let metadata = std::fs::metadata(path).map_err(|e| CacheError::IoError(e.to_string()))?;
        if metadata.len() > MAX_CACHE_FILE_SIZE {
            return Err(CacheError::CacheTooLarge {
                size: metadata.len(),
                max: MAX_CACHE_FILE_SIZE,
            });
        }

        let contents =
            std::fs::read_to_string(path).map_err(|e| CacheError::IoError(e.to_string()))?;
        let cache: LightboxCache = serde_json::from_str(&contents).map_err(|e| {
            warn!(error = %e, "Failed to deserialize lightbox cache");
            CacheError::DeserializationError(e.to_string())
        })?;

        if cache.schema_version != SCHEMA_VERSION {
            return Err(CacheError::SchemaVersionMismatch {
                expected: SCHEMA_VERSION.to_string(),
                found: cache.schema_version,
            });
        }

        info!(
            path = %path.display(),
            photos = cache.photos.len(),
            lightboxes = cache.lightboxes.len(),
            "Lightbox cache loaded"
        );
        Ok(cache)
    }
}

impl PresenceCache for LightboxCache {
    fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.photos.contains_key(key))
    }
}

fn lock_path(path: &Path) -> PathBuf {
    path.with_extension("lock")
}
