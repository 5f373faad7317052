// crates/robogate-core/src/time.rs
// ============================================================================
// Module: Robogate Timestamps
// Description: UTC timestamps with a monotonic-anchored issuing clock.
// Purpose: Guarantee strictly increasing event timestamps even when the wall
//          clock steps backward.
// Dependencies: time, serde
// ============================================================================

//! ## Overview
//! Event timestamps must be strictly increasing within a run (§5). A
//! [`MonotonicClock`] enforces this by clamping to `prev_ts + 1us` whenever
//! the wall clock would otherwise produce a timestamp that does not advance.

use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// UTC timestamp, stored as microseconds since the Unix epoch.
///
/// # Invariants
/// - Serializes as an RFC3339 string with microsecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from microseconds since the Unix epoch.
    #[must_use]
    pub const fn from_unix_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Returns microseconds since the Unix epoch.
    #[must_use]
    pub const fn as_unix_micros(self) -> i64 {
        self.0
    }

    /// Returns the timestamp one microsecond after this one.
    #[must_use]
    pub const fn succ(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let rendered = to_rfc3339(*self).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&rendered)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        from_rfc3339(&raw).map_err(serde::de::Error::custom)
    }
}

/// Renders a timestamp as an RFC3339 string with microsecond precision.
///
/// # Errors
///
/// Returns an error if the timestamp cannot be represented as a calendar date.
pub fn to_rfc3339(ts: Timestamp) -> Result<String, time::error::Format> {
    let nanos = i128::from(ts.0) * 1_000;
    let dt = OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);
    dt.format(&Rfc3339)
}

/// Parses an RFC3339 string into a timestamp, truncating to microseconds.
///
/// # Errors
///
/// Returns an error if the string is not valid RFC3339.
pub fn from_rfc3339(raw: &str) -> Result<Timestamp, time::error::Parse> {
    let dt = OffsetDateTime::parse(raw, &Rfc3339)?;
    let micros = dt.unix_timestamp_nanos() / 1_000;
    Ok(Timestamp(i64::try_from(micros).unwrap_or(i64::MAX)))
}

/// Monotonic-anchored clock producing strictly increasing [`Timestamp`]s.
///
/// # Invariants
/// - Successive calls to [`MonotonicClock::now`] never return a
///   non-increasing value, even across wall-clock steps backward.
pub struct MonotonicClock {
    last_micros: AtomicI64,
}

impl MonotonicClock {
    /// Creates a clock anchored at the current wall-clock time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            last_micros: AtomicI64::new(wall_clock_micros()),
        }
    }

    /// Returns the next timestamp, clamped to strictly exceed the previous one.
    pub fn now(&self) -> Timestamp {
        let wall = wall_clock_micros();
        loop {
            let prev = self.last_micros.load(Ordering::Acquire);
            let candidate = if wall > prev { wall } else { prev + 1 };
            if self
                .last_micros
                .compare_exchange(prev, candidate, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Timestamp(candidate);
            }
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads the wall clock in microseconds since the Unix epoch.
fn wall_clock_micros() -> i64 {
    let now = OffsetDateTime::now_utc();
    i64::try_from(now.unix_timestamp_nanos() / 1_000).unwrap_or(i64::MAX)
}
