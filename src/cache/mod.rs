//! Local presence caches
//!
//! Photo analysis needs one synchronous question answered per photo: "is this id
//! known to the cache?". [`PresenceCache`] is that seam; [`LightboxCache`] is the
//! persisted implementation filled by [`LightboxCacheBuilder`].

pub mod builder;
pub mod lightbox;

pub use builder::{CacheBuildSummary, LightboxCacheBuilder};
pub use lightbox::{fingerprint, LightboxCache, LightboxEntry};

use std::collections::{BTreeSet, HashSet};

use crate::api::ApiError;

/// Synchronous presence lookup
pub trait PresenceCache: Send + Sync {
    /// Whether `key` is present
    fn exists(&self, key: &str) -> CacheResult<bool>;
}

impl PresenceCache for HashSet<String> {
    fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.contains(key))
    }
}

impl PresenceCache for BTreeSet<String> {
    fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.contains(key))
    }
}

/// Cache errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Schema version mismatch
    #[error("schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch {
        /// Expected schema version
        expected: String,
        /// Found schema version
        found: String,
    },

    /// Cache file too large
    #[error("cache file too large: {size} bytes (max: {max} bytes)")]
    CacheTooLarge {
        /// Actual file size
        size: u64,
        /// Maximum allowed size
        max: u64,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("deserialization error: {0}")]
    DeserializationError(String),

    /// Lock error
    #[error("lock error: {0}")]
    LockError(String),

    /// Listing failed before anything was cached
    #[error("API error: {0}")]
    Api(#[from] ApiError),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
