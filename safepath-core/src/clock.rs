//! Wall-clock abstraction.
//!
//! Scoring depends on local time of day, and caches expire by timestamp, so
//! services read time through [`Clock`] instead of calling `Local::now`
//! directly. Tests substitute a manually advanced clock.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Local};

/// Source of the current local time.
pub trait Clock: Send + Sync {
    /// Current time in the user's local offset.
    fn now(&self) -> DateTime<FixedOffset>;
}

impl<T> Clock for Arc<T>
where
    T: Clock + ?Sized,
{
    fn now(&self) -> DateTime<FixedOffset> {
        (**self).now()
    }
}

/// [`Clock`] backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Number of whole `bucket`-sized windows since the Unix epoch at `at`.
///
/// Used to make time-varying heuristics deterministic within a window.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use chrono::DateTime;
/// use safepath_core::time_bucket;
///
/// let at = DateTime::parse_from_rfc3339("1970-01-01T00:25:00+00:00").unwrap();
/// assert_eq!(time_bucket(at, Duration::from_secs(600)), 2);
/// ```
#[must_use]
pub fn time_bucket(at: DateTime<FixedOffset>, bucket: std::time::Duration) -> i64 {
    let width = i64::try_from(bucket.as_secs()).unwrap_or(i64::MAX).max(1);
    at.timestamp().div_euclid(width)
}
