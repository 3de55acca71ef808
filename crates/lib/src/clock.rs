//! Time provider abstraction
//!
//! Every timestamp written into a document (`createdAt`, `updatedAt`,
//! `loginTime`, `_migratedAt`) and every time-derived id (`TN-…`, `USR-…`)
//! is taken from a [`Clock`], so tests can pin time while production uses
//! the system clock.
//!
//! # Example
//!
//! ```
//! use transitpay::{Clock, SystemClock};
//!
//! let clock = SystemClock;
//! let id = clock.time_id("TN");
//! assert!(id.starts_with("TN-"));
//! ```

use std::fmt::Debug;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, SecondsFormat, Utc};

#[cfg(any(test, feature = "testing"))]
use std::sync::Mutex;

/// A time provider for timestamps and time-derived identifiers.
pub trait Clock: Send + Sync + Debug {
    /// Current time as milliseconds since Unix epoch.
    fn now_millis(&self) -> u64;

    /// Current time as an ISO-8601 UTC string with millisecond precision,
    /// e.g. `2024-01-01T00:00:00.000Z`.
    fn timestamp(&self) -> String {
        format_millis(self.now_millis())
    }

    /// An opaque identifier derived from the current time: `{prefix}-{millis}`.
    fn time_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.now_millis())
    }
}

/// Render milliseconds since the epoch the way documents store timestamps.
pub fn format_millis(millis: u64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis as i64)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Production clock using real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// Test clock that advances by one millisecond on every read.
///
/// Successive ids are therefore unique, and timestamps are strictly
/// increasing, without tests having to sleep.
#[cfg(any(test, feature = "testing"))]
#[derive(Debug)]
pub struct FixedClock {
    millis: Mutex<u64>,
}

#[cfg(any(test, feature = "testing"))]
impl FixedClock {
    /// Create a clock starting at `millis`.
    pub fn new(millis: u64) -> Self {
        Self {
            millis: Mutex::new(millis),
        }
    }

    /// Move the clock forward by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        *self.millis.lock().unwrap_or_else(|e| e.into_inner()) += ms;
    }

    /// Current value without advancing.
    pub fn get(&self) -> u64 {
        *self.millis.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(any(test, feature = "testing"))]
impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        let mut millis = self.millis.lock().unwrap_or_else(|e| e.into_inner());
        let t = *millis;
        *millis += 1;
        t
    }
}

#[cfg(any(test, feature = "testing"))]
impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01 00:00:00 UTC
        Self::new(1_704_067_200_000)
    }
}
