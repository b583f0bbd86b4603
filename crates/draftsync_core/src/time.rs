//! Timestamps and the clock abstraction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

/// A wall-clock instant in milliseconds since the Unix epoch.
///
/// Timestamps are totally ordered; reconciliation compares them directly for
/// last-writer-wins. Millisecond precision matches what remote document
/// stores hand back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The Unix epoch.
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Creates a timestamp from milliseconds since the Unix epoch.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Returns the milliseconds since the Unix epoch.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Returns this timestamp advanced by `duration` (saturating).
    #[must_use]
    pub fn saturating_add(self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.as_millis() as u64))
    }

    /// Returns the duration elapsed since `earlier`, or zero if `earlier`
    /// is in the future.
    #[must_use]
    pub fn saturating_since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// A source of wall-clock time.
///
/// All engine and store components read time through this trait so tests can
/// drive timestamps deterministically.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let millis = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Timestamp::from_millis(millis)
    }
}

/// A manually advanced clock for testing.
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    /// Creates a clock starting at the given instant.
    #[must_use]
    pub fn starting_at(at: Timestamp) -> Self {
        Self {
            millis: AtomicU64::new(at.as_millis()),
        }
    }

    /// Sets the current instant.
    pub fn set(&self, at: Timestamp) {
        self.millis.store(at.as_millis(), Ordering::SeqCst);
    }

    /// Advances the clock by `duration`.
    pub fn advance(&self, duration: Duration) {
        self.millis
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_numeric() {
        assert!(Timestamp::from_millis(10) < Timestamp::from_millis(20));
        assert_eq!(Timestamp::from_millis(5), Timestamp::from_millis(5));
    }

    #[test]
    fn saturating_arithmetic() {
        let t = Timestamp::from_millis(1_000);
        assert_eq!(t.saturating_add(Duration::from_millis(500)).as_millis(), 1_500);
        assert_eq!(
            t.saturating_since(Timestamp::from_millis(400)),
            Duration::from_millis(600)
        );
        assert_eq!(t.saturating_since(Timestamp::from_millis(2_000)), Duration::ZERO);
    }

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::starting_at(Timestamp::from_millis(100));
        assert_eq!(clock.now().as_millis(), 100);

        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now().as_millis(), 350);

        clock.set(Timestamp::EPOCH);
        assert_eq!(clock.now(), Timestamp::EPOCH);
    }

    #[test]
    fn system_clock_is_past_epoch() {
        assert!(SystemClock.now() > Timestamp::EPOCH);
    }
}
