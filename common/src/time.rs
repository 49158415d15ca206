//! Time utilities and constants for CalcX.

use chrono::{DateTime, Duration, Utc};

/// Timing constants.
pub mod constants {
    use super::Duration;

    /// Maximum age of a cached rate snapshot (1 hour).
    pub fn rate_freshness_window() -> Duration {
        Duration::hours(1)
    }

    /// Timeout for a single remote rate request (15 seconds).
    pub fn rate_request_timeout() -> Duration {
        Duration::seconds(15)
    }
}

/// A timestamp, always UTC.
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Age of `timestamp` relative to `at`. Negative for future timestamps.
pub fn age_at(timestamp: Timestamp, at: Timestamp) -> Duration {
    at.signed_duration_since(timestamp)
}

/// Check if `timestamp` is no older than `window` at instant `at`.
pub fn is_within(timestamp: Timestamp, window: Duration, at: Timestamp) -> bool {
    age_at(timestamp, at) <= window
}

/// Duration extensions for convenient construction.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}
