//! Recursive date range bisection

use std::fmt;
use tracing::{debug, info, warn};

use super::{DateRange, RangeResult};
use crate::processor::config::{MAX_RECORDS_PER_RANGE, MAX_RECURSION_DEPTH};

/// Count-only query used to decide whether a range needs splitting
///
/// Implemented for closures `Fn(&DateRange) -> Result<u64, E>` so tests and callers can
/// pass a probe inline.
pub trait HitProbe {
    /// Error produced by a failed probe
    type Error: fmt::Display;

    /// Total hits the upstream search reports for `range`
    fn total_hits(&self, range: &DateRange) -> Result<u64, Self::Error>;
}

impl<F, E> HitProbe for F
where
    F: Fn(&DateRange) -> Result<u64, E>,
    E: fmt::Display,
{
    type Error = E;

    fn total_hits(&self, range: &DateRange) -> Result<u64, E> {
        self(range)
    }
}

/// What to do when a probe fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProbeFailurePolicy {
    /// Treat the count as 0 and keep the range whole
    #[default]
    FailOpen,
    /// Treat the count as over the ceiling and keep splitting
    ForceSplit,
}

/// Bisects a date range until every piece probes at or below the ceiling
#[derive(Debug, Clone)]
pub struct RangeSplitter {
    ceiling: u64,
    max_depth: u32,
    failure_policy: ProbeFailurePolicy,
}

impl Default for RangeSplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl RangeSplitter {
    /// Splitter with the API's result window as ceiling and depth 10
    pub fn new() -> Self {
        Self {
            ceiling: MAX_RECORDS_PER_RANGE,
            max_depth: MAX_RECURSION_DEPTH,
            failure_policy: ProbeFailurePolicy::default(),
        }
    }

    /// Override the hit ceiling
    pub fn with_ceiling(mut self, ceiling: u64) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// Override the recursion limit
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Override the probe failure policy
    pub fn with_failure_policy(mut self, policy: ProbeFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Hit ceiling
    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    /// Recursion limit
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Parse and validate `start`/`end`, then split
    ///
    /// Invalid input is rejected before the probe is ever called.
    pub fn split_str<P: HitProbe>(
        &self,
        start: &str,
        end: &str,
        probe: &P,
    ) -> RangeResult<Vec<DateRange>> {
        let range = DateRange::parse(start, end)?;
        Ok(self.split(&range, probe))
    }

    /// Split `range` into contiguous pieces ordered left to right
    ///
    /// The first piece starts at `range.start()`, the last ends at `range.end()`, and
    /// each piece ends where the next one starts. Pieces returned at the depth limit may
    /// still exceed the ceiling.
    pub fn split<P: HitProbe>(&self, range: &DateRange, probe: &P) -> Vec<DateRange> {
        let mut ranges = Vec::new();
        self.split_recursive(*range, probe, 0, &mut ranges);
        info!(
            input = %range,
            ranges = ranges.len(),
            "Date range split complete"
        );
        ranges
    }

    fn split_recursive<P: HitProbe>(
        &self,
        range: DateRange,
        probe: &P,
        depth: u32,
        out: &mut Vec<DateRange>,
    ) {
        if depth >= self.max_depth {
            warn!(range = %range, depth, "Max recursion depth reached, keeping range");
            out.push(range);
            return;
        }

        let hits = match probe.total_hits(&range) {
            Ok(hits) => hits,
            Err(e) => match self.failure_policy {
                ProbeFailurePolicy::FailOpen => {
                    warn!(range = %range, error = %e, "Hit probe failed, keeping range unsplit");
                    0
                }
                ProbeFailurePolicy::ForceSplit => {
                    warn!(range = %range, error = %e, "Hit probe failed, splitting anyway");
                    u64::MAX
                }
            },
        };
        debug!(range = %range, hits, depth, "Probed date range");

        if hits <= self.ceiling {
            out.push(range);
            return;
        }

        match range.bisect() {
            Some((left, right)) => {
                debug!(
                    range = %range,
                    midpoint = %left.end_str(),
                    "Splitting date range"
                );
                self.split_recursive(left, probe, depth + 1, out);
                self.split_recursive(right, probe, depth + 1, out);
            }
            None => {
                warn!(range = %range, hits, "Range too narrow to split, keeping range");
                out.push(range);
            }
        }
    }
}
