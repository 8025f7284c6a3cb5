//! CLI error types and conversions

use crate::api::ApiError;
use crate::cache::CacheError;
use crate::cleanup::CleanupError;
use crate::output::OutputError;
use crate::processor::{ProcessorError, RateLimitError};
use crate::range::RangeError;
use crate::report::ReportError;
use crate::status::StatusError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Date range error
    #[error("date range error: {0}")]
    RangeError(#[from] RangeError),

    /// API error
    #[error("api error: {0}")]
    ApiError(#[from] ApiError),

    /// Processor error
    #[error("processor error: {0}")]
    ProcessorError(#[from] ProcessorError),

    /// Rate limit error
    #[error("rate limit error: {0}")]
    RateLimitError(#[from] RateLimitError),

    /// Status check error
    #[error("status check error: {0}")]
    StatusError(#[from] StatusError),

    /// Output error
    #[error("output error: {0}")]
    OutputError(#[from] OutputError),

    /// Cache error
    #[error("cache error: {0}")]
    CacheError(#[from] CacheError),

    /// Report error
    #[error("report error: {0}")]
    ReportError(#[from] ReportError),

    /// Cleanup error
    #[error("cleanup error: {0}")]
    CleanupError(#[from] CleanupError),

    /// Result could not be serialized
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}
