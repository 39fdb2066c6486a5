//! Integer nanosecond time primitives.
//!
//! Timestamps stay integral for determinism; float seconds only appear at the
//! edges (configuration files, rendered log fields).

use serde::{Deserialize, Serialize};

/// Duration in nanoseconds.
pub type DurationNs = i64;

/// Nanoseconds per second.
pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Tick period used when a rate is missing or non-positive (10 Hz).
pub const DEFAULT_PERIOD_NS: DurationNs = 100_000_000;

/// Timestamp in integer nanoseconds.
///
/// Interpretation (run-relative vs. epoch) is defined by the field holding it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TimestampNs(pub i64);

impl TimestampNs {
    /// Logical run origin.
    pub const ZERO: Self = Self(0);

    /// Build from nanoseconds.
    #[inline]
    pub const fn from_nanos(ns: i64) -> Self {
        Self(ns)
    }

    /// Raw nanoseconds.
    #[inline]
    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    /// Seconds as `f64` (lossy for very large values).
    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC as f64
    }

    /// Render seconds with six fixed decimals.
    ///
    /// Computed in integer arithmetic (rounded to the nearest microsecond) so
    /// the rendering is identical on every platform.
    pub fn format_secs(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let micros = (self.0.unsigned_abs() + 500) / 1_000;
        format!("{sign}{}.{:06}", micros / 1_000_000, micros % 1_000_000)
    }

    /// Offset by a duration, saturating at the `i64` bounds.
    #[inline]
    pub fn saturating_add(self, delta: DurationNs) -> Self {
        Self(self.0.saturating_add(delta))
    }
}

impl From<i64> for TimestampNs {
    fn from(ns: i64) -> Self {
        Self(ns)
    }
}

/// Convert seconds to nanoseconds (truncating toward zero).
#[inline]
pub fn seconds_to_ns(seconds: f64) -> DurationNs {
    (seconds * NANOS_PER_SEC as f64) as DurationNs
}

/// Convert nanoseconds to seconds.
#[inline]
pub fn ns_to_seconds(ns: DurationNs) -> f64 {
    ns as f64 / NANOS_PER_SEC as f64
}

/// Period of a rate in nanoseconds, rounded to the nearest nanosecond.
///
/// Falls back to [`DEFAULT_PERIOD_NS`] for non-finite or non-positive rates.
pub fn hz_to_period_ns(hz: f64) -> DurationNs {
    if !hz.is_finite() || hz <= 0.0 {
        return DEFAULT_PERIOD_NS;
    }
    ((NANOS_PER_SEC as f64) / hz).round() as DurationNs
}
