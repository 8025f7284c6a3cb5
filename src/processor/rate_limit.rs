//! Uniform request pacing
//!
//! A [`RateGovernor`] spaces successive calls by a fixed interval measured from the
//! moment the previous `acquire()` returned. It is shared (behind an `Arc`) by every
//! worker that talks to the same endpoint family.

use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::trace;

/// Last-call-timestamp pacer
#[derive(Debug)]
pub struct RateGovernor {
    interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateGovernor {
    /// Create a governor allowing `rate` calls per second
    pub fn per_second(rate: u32) -> Result<Self, RateLimitError> {
        if rate == 0 {
            return Err(RateLimitError::InvalidRate(
                "rate must be at least 1 request per second".to_string(),
            ));
        }
        Ok(Self::with_interval(Duration::from_secs(1) / rate))
    }

    /// Create a governor allowing `calls` calls per minute
    pub fn per_minute(calls: u32) -> Result<Self, RateLimitError> {
        if calls == 0 {
            return Err(RateLimitError::InvalidRate(
                "rate must be at least 1 request per minute".to_string(),
            ));
        }
        Ok(Self::with_interval(Duration::from_secs(60) / calls))
    }

    /// Create a governor with an explicit minimum spacing
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            last_call: Mutex::new(None),
        }
    }

    /// Minimum spacing between two calls
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block until the minimum spacing since the previous call has elapsed
    ///
    /// The lock is held while sleeping so concurrent callers queue behind each other
    /// and each observes the full interval after its predecessor. Returns the time
    /// spent waiting.
    pub fn acquire(&self) -> Duration {
        let mut last_call = self
            .last_call
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let waited = match *last_call {
            Some(previous) => {
                let elapsed = previous.elapsed();
                if elapsed < self.interval {
                    let deficit = self.interval - elapsed;
                    trace!(wait_ms = deficit.as_millis() as u64, "Pacing request");
                    thread::sleep(deficit);
                    deficit
                } else {
                    Duration::ZERO
                }
            }
            None => Duration::ZERO,
        };

        *last_call = Some(Instant::now());
        waited
    }
}

/// Rate governor errors
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    /// Rate of zero or otherwise unusable
    #[error("invalid rate: {0}")]
    InvalidRate(String),
}
