//! Virtual clock values
//!
//! One virtual time unit is one second. The clock counts whole nanoseconds in
//! a `u64`, so instants are totally ordered and equal instants are exactly
//! equal. Adding a delay saturates at the end of representable time instead
//! of wrapping.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::time::Duration;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// A point on the simulation's virtual clock, in nanoseconds since time zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimTime(u64);

impl SimTime {
    /// Largest number of virtual seconds a `SimTime` can hold.
    pub const MAX_SECS: f64 = u64::MAX as f64 / NANOS_PER_SEC as f64;

    /// The start of every simulation.
    pub const fn zero() -> Self {
        SimTime(0)
    }

    pub const fn from_nanos(nanos: u64) -> Self {
        SimTime(nanos)
    }

    pub const fn from_millis(millis: u64) -> Self {
        SimTime(millis * 1_000_000)
    }

    pub const fn from_secs(secs: u64) -> Self {
        SimTime(secs * NANOS_PER_SEC)
    }

    /// Converts fractional virtual seconds, rounding to the nearest nanosecond.
    ///
    /// # Panics
    ///
    /// Panics unless `secs` is finite and within `0..=SimTime::MAX_SECS`.
    /// Configuration is expected to be validated against that range first.
    pub fn from_secs_f64(secs: f64) -> Self {
        assert!(
            secs.is_finite() && secs >= 0.0,
            "SimTime must be finite and non-negative, got {secs}"
        );
        assert!(
            secs <= Self::MAX_SECS,
            "SimTime out of range: {secs} s (max {} s)",
            Self::MAX_SECS
        );
        // Float to int casts saturate, so MAX_SECS itself maps to u64::MAX.
        SimTime((secs * NANOS_PER_SEC as f64).round() as u64)
    }

    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    /// Fractional virtual seconds since time zero.
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC as f64
    }

    /// Time elapsed since `earlier`, zero if `earlier` is in the future.
    pub fn duration_since(&self, earlier: SimTime) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;

    fn add(self, delay: Duration) -> SimTime {
        let nanos = u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX);
        SimTime(self.0.saturating_add(nanos))
    }
}

impl Default for SimTime {
    fn default() -> Self {
        SimTime::zero()
    }
}

impl fmt::Display for SimTime {
    /// Seconds with millisecond precision, e.g. `12.500s`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0 / NANOS_PER_SEC;
        let millis = (self.0 % NANOS_PER_SEC) / 1_000_000;
        write!(f, "{secs}.{millis:03}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units() {
        assert_eq!(SimTime::zero().as_nanos(), 0);
        assert_eq!(SimTime::from_millis(1).as_nanos(), 1_000_000);
        assert_eq!(SimTime::from_secs(3), SimTime::from_millis(3000));
        assert_eq!(SimTime::from_secs_f64(0.25), SimTime::from_millis(250));
        assert_eq!(SimTime::from_millis(2500).as_secs_f64(), 2.5);
    }

    #[test]
    fn test_adding_delays() {
        let arrival = SimTime::from_millis(100);
        let completion = arrival + Duration::from_millis(400);

        assert_eq!(completion, SimTime::from_millis(500));
        assert_eq!(completion.duration_since(arrival), Duration::from_millis(400));
        assert_eq!(arrival.duration_since(completion), Duration::ZERO);
    }

    #[test]
    fn test_adding_huge_delay_saturates() {
        let end = SimTime::from_secs(1) + Duration::MAX;
        assert_eq!(end.as_nanos(), u64::MAX);
        assert_eq!(end + Duration::from_secs(1), end);
    }

    #[test]
    fn test_max_secs_is_representable() {
        assert_eq!(SimTime::from_secs_f64(SimTime::MAX_SECS).as_nanos(), u64::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(SimTime::from_millis(1500).to_string(), "1.500s");
        assert_eq!(SimTime::from_nanos(7).to_string(), "0.000s");
        assert_eq!(SimTime::from_secs(5000).to_string(), "5000.000s");
    }

    #[test]
    #[should_panic(expected = "finite and non-negative")]
    fn test_negative_seconds_panic() {
        let _ = SimTime::from_secs_f64(-1.0);
    }

    #[test]
    #[should_panic(expected = "finite and non-negative")]
    fn test_nan_seconds_panic() {
        let _ = SimTime::from_secs_f64(f64::NAN);
    }

    #[test]
    #[should_panic(expected = "SimTime out of range")]
    fn test_seconds_past_max_panic() {
        let _ = SimTime::from_secs_f64(1e11);
    }
}
