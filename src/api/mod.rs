//! Content platform REST API clients
//!
//! # Overview
//!
//! All CRUD and search traffic goes through one blocking [`ApiClient`] per endpoint
//! family, each optionally paced by a shared [`RateGovernor`](crate::processor::RateGovernor).
//! The typed wrappers are thin:
//!
//! - [`ContentSearch`]: hit probes and paginated search for one website
//! - [`DraftApi`]: redirect deletes, story unpublish and delete
//! - [`PhotoApi`]: photo listing, references, gallery usage, expire/delete, lightboxes
//!
//! Blocking clients run on executor worker threads. They must not be created or
//! dropped inside an async runtime.

pub mod draft;
pub mod http;
pub mod photos;
pub mod search;

pub use draft::DraftApi;
pub use http::{ApiClient, RawResponse};
pub use photos::{PhotoApi, PhotoFilter, PhotoReferences};
pub use search::{ContentSearch, SearchPage};

use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

/// API errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Connection-level failure
    #[error("network error: {0}")]
    NetworkError(String),

    /// Request exceeded its timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    HttpError {
        /// Status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Response body did not match the expected shape
    #[error("parse error: {0}")]
    ParseError(String),

    /// Client could not be constructed
    #[error("client configuration error: {0}")]
    ConfigError(String),
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Target environment of the organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArcEnvironment {
    /// Production tenant
    Production,
    /// Sandbox tenant (`sandbox.{org}`)
    #[default]
    Sandbox,
}

impl ArcEnvironment {
    /// Lowercase name used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            ArcEnvironment::Production => "production",
            ArcEnvironment::Sandbox => "sandbox",
        }
    }

    /// Host-qualified organization (`org` or `sandbox.org`)
    pub fn qualified_org(&self, org: &str) -> String {
        match self {
            ArcEnvironment::Production => org.to_string(),
            ArcEnvironment::Sandbox => format!("sandbox.{org}"),
        }
    }

    /// API base URL for `org` in this environment
    pub fn base_url(&self, org: &str) -> String {
        format!("https://api.{}.arcpublishing.com", self.qualified_org(org))
    }
}

impl fmt::Display for ArcEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
