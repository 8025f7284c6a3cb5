//! Date ranges and result-window partitioning
//!
//! The search API will not page past its result window, so a date window whose total
//! hit count exceeds the window is bisected until every piece fits. See
//! [`RangeSplitter`] for the algorithm and [`DateRange`] for the boundary rules.

pub mod splitter;

pub use splitter::{HitProbe, ProbeFailurePolicy, RangeSplitter};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::fmt;

/// Query/display format for range boundaries
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Date range errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// Boundary could not be parsed
    #[error("invalid timestamp '{input}': expected YYYY-MM-DD, YYYY-MM-DDTHH:MM:SS or RFC 3339")]
    InvalidTimestamp {
        /// Offending input
        input: String,
    },

    /// Start is not strictly before end
    #[error("invalid range: start {start} must be before end {end}")]
    InvalidRange {
        /// Formatted start
        start: String,
        /// Formatted end
        end: String,
    },
}

/// Result type for range operations
pub type RangeResult<T> = Result<T, RangeError>;

/// Date window `[start, end]` with `start < end`
///
/// Bisection shares the midpoint: the left half ends and the right half starts on the
/// same instant, so adjacent ranges touch without gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DateRange {
    /// Build a range, rejecting `start >= end`
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> RangeResult<Self> {
        if start >= end {
            return Err(RangeError::InvalidRange {
                start: format_timestamp(&start),
                end: format_timestamp(&end),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse both boundaries and validate ordering
    pub fn parse(start: &str, end: &str) -> RangeResult<Self> {
        Self::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }

    /// Range start
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Range end
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Start in query form
    pub fn start_str(&self) -> String {
        format_timestamp(&self.start)
    }

    /// End in query form
    pub fn end_str(&self) -> String {
        format_timestamp(&self.end)
    }

    /// Arithmetic mean of start and end
    pub fn midpoint(&self) -> NaiveDateTime {
        self.start + (self.end - self.start) / 2
    }

    /// Split into `[start, mid]` and `[mid, end]`
    ///
    /// Returns `None` when the range is too narrow for the midpoint to move off a boundary.
    pub fn bisect(&self) -> Option<(DateRange, DateRange)> {
        let mid = self.midpoint();
        if mid <= self.start || mid >= self.end {
            return None;
        }
        Some((
            DateRange {
                start: self.start,
                end: mid,
            },
            DateRange {
                start: mid,
                end: self.end,
            },
        ))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start_str(), self.end_str())
    }
}

impl Serialize for DateRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Parse `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.fff]` or RFC 3339 (converted to UTC)
pub fn parse_timestamp(input: &str) -> RangeResult<NaiveDateTime> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.naive_utc());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(dt);
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| RangeError::InvalidTimestamp {
            input: input.to_string(),
        })
}

/// Format a boundary as `2020-01-16T00:00:00`, keeping sub-second digits only when present
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}
