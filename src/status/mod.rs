//! Asynchronous batch status checking
//!
//! # Overview
//!
//! [`StatusChecker`] issues one GET per unique URL without following redirects, so the
//! caller sees the redirect status itself (301, 302, 404, ...). Checks run on a
//! single-threaded tokio runtime: batches go one after another, and inside a batch every
//! check is polled concurrently behind a semaphore.
//!
//! # Quick Start
//!
//! ```no_run
//! use content_audit::status::{check_all_blocking, StatusCheckConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let urls = vec!["/a".to_string(), "/a".to_string(), "/b".to_string()];
//! let statuses = check_all_blocking("https://www.example.com", StatusCheckConfig::default(), &urls)?;
//! assert!(statuses.len() <= 2);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! A check never fails the batch. Timeouts map to [`CheckStatus::Timeout`], every other
//! failure (DNS, connection refused, malformed URL) to [`CheckStatus::Error`].

use futures::future::join_all;
use reqwest::redirect::Policy;
use reqwest::Client;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

use crate::processor::config::{
    chunk_count, DEFAULT_STATUS_BATCH_SIZE, DEFAULT_STATUS_CONCURRENCY, DEFAULT_STATUS_TIMEOUT_SECS,
};

/// User agent sent with every status check
pub const STATUS_USER_AGENT: &str = "content-audit-status-check";

/// Status checker errors
#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    /// HTTP client could not be built
    #[error("client configuration error: {0}")]
    ClientError(String),

    /// Async runtime could not be started
    #[error("runtime error: {0}")]
    RuntimeError(String),

    /// Invalid settings
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for status checking
pub type StatusResult<T> = Result<T, StatusError>;

/// Observed status of one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckStatus {
    /// HTTP status code of the first response
    Code(u16),
    /// Check exceeded its timeout
    Timeout,
    /// Any other failure
    Error,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Code(code) => write!(f, "{code}"),
            CheckStatus::Timeout => f.write_str("timeout"),
            CheckStatus::Error => f.write_str("error"),
        }
    }
}

impl Serialize for CheckStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CheckStatus::Code(code) => serializer.serialize_u16(*code),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

/// Status checker settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCheckConfig {
    /// Maximum in-flight checks
    pub concurrency: usize,
    /// URLs per batch
    pub batch_size: usize,
    /// Per-check timeout
    pub timeout: Duration,
}

impl Default for StatusCheckConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_STATUS_CONCURRENCY,
            batch_size: DEFAULT_STATUS_BATCH_SIZE,
            timeout: Duration::from_secs(DEFAULT_STATUS_TIMEOUT_SECS),
        }
    }
}

impl StatusCheckConfig {
    /// Reject zero concurrency, batch size or timeout
    pub fn validate(&self) -> StatusResult<()> {
        if self.concurrency == 0 {
            return Err(StatusError::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(StatusError::InvalidConfig(
                "batch size must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(StatusError::InvalidConfig(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Rows that carry a URL to check and a slot for its status
pub trait StatusTarget {
    /// URL to check, if the row has one
    fn status_url(&self) -> Option<&str>;

    /// Store the status observed for [`status_url`](Self::status_url)
    fn set_status(&mut self, status: Option<CheckStatus>);
}

/// Concurrent status checker holding one HTTP session
pub struct StatusChecker {
    client: Client,
    domain: String,
    config: StatusCheckConfig,
}

impl StatusChecker {
    /// Create a checker resolving relative URLs against `domain`
    pub fn new(domain: &str, config: StatusCheckConfig) -> StatusResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(config.timeout)
            .user_agent(STATUS_USER_AGENT)
            .build()
            .map_err(|e| StatusError::ClientError(e.to_string()))?;

        Ok(Self {
            client,
            domain: domain.trim_end_matches('/').to_string(),
            config,
        })
    }

    /// Absolute URL for `url`: kept as-is when it has a scheme, else prefixed with the domain
    pub fn resolve(&self, url: &str) -> String {
        if Url::parse(url).is_ok_and(|parsed| parsed.has_host()) {
            return url.to_string();
        }
        if url.starts_with('/') {
            format!("{}{}", self.domain, url)
        } else {
            format!("{}/{}", self.domain, url)
        }
    }

    /// Check one URL
    pub async fn check_one(&self, url: &str) -> CheckStatus {
        let full_url = self.resolve(url);
        let request = self.client.get(&full_url).send();

        match tokio::time::timeout(self.config.timeout, request).await {
            Ok(Ok(response)) => CheckStatus::Code(response.status().as_u16()),
            Ok(Err(e)) if e.is_timeout() => {
                warn!(url = %full_url, "Timeout checking URL");
                CheckStatus::Timeout
            }
            Ok(Err(e)) => {
                warn!(url = %full_url, error = %e, "Error checking URL");
                CheckStatus::Error
            }
            Err(_) => {
                warn!(url = %full_url, "Timeout checking URL");
                CheckStatus::Timeout
            }
        }
    }

    /// Check every unique URL in `urls`, keyed by the URL as given
    pub async fn check_all(&self, urls: &[String]) -> HashMap<String, CheckStatus> {
        let unique = dedupe_preserving_order(urls);
        info!(
            input = urls.len(),
            unique = unique.len(),
            "Removed duplicate URLs before status check"
        );

        let semaphore = Semaphore::new(self.config.concurrency);
        let total_batches = chunk_count(unique.len(), self.config.batch_size);
        let mut statuses = HashMap::with_capacity(unique.len());

        for (index, batch) in unique.chunks(self.config.batch_size).enumerate() {
            debug!(
                batch = index + 1,
                batches = total_batches,
                size = batch.len(),
                "Checking URL batch"
            );

            let checks = batch.iter().map(|url| {
                let semaphore = &semaphore;
                async move {
                    let status = match semaphore.acquire().await {
                        Ok(_permit) => self.check_one(url).await,
                        Err(_) => CheckStatus::Error,
                    };
                    (url.clone(), status)
                }
            });

            statuses.extend(join_all(checks).await);
        }

        info!(summary = ?summarize(&statuses), "Status check completed");
        statuses
    }
}

/// Check `urls` on a fresh current-thread runtime
///
/// The runtime and the HTTP session are dropped before this returns, on every path.
pub fn check_all_blocking(
    domain: &str,
    config: StatusCheckConfig,
    urls: &[String],
) -> StatusResult<HashMap<String, CheckStatus>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| StatusError::RuntimeError(e.to_string()))?;

    runtime.block_on(async {
        let checker = StatusChecker::new(domain, config)?;
        Ok(checker.check_all(urls).await)
    })
}

/// Remove duplicates, keeping the first occurrence of each URL
pub fn dedupe_preserving_order(urls: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(urls.len());
    urls.iter()
        .filter(|url| seen.insert(url.as_str()))
        .cloned()
        .collect()
}

/// Write each row's status from `statuses`, `None` when its URL was not checked
pub fn merge_statuses<R: StatusTarget>(rows: &mut [R], statuses: &HashMap<String, CheckStatus>) {
    for row in rows.iter_mut() {
        let status = row.status_url().and_then(|url| statuses.get(url)).copied();
        row.set_status(status);
    }
}

fn summarize(statuses: &HashMap<String, CheckStatus>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for status in statuses.values() {
        *counts.entry(status.to_string()).or_insert(0) += 1;
    }
    counts
}
