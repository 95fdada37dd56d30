//! Time utilities for relayswitch
//!
//! Every timeout in the system (freeze windows, heartbeat interval) is measured
//! on the monotonic clock so that wall-clock adjustments on the device cannot
//! release a switch early or stall the heartbeat.

use std::time::{Duration, Instant};

/// A point in monotonic time. Immune to wall-clock changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonotonicInstant(Instant);

impl MonotonicInstant {
    pub fn now() -> Self {
        Self(Instant::now())
    }

    /// Saturates to zero when `earlier` is actually later than `self`
    pub fn duration_since(&self, earlier: MonotonicInstant) -> Duration {
        self.0.saturating_duration_since(earlier.0)
    }

    /// Time left of a `window` that opened at `self`, zero once it has passed.
    ///
    /// Never forms `self + window`, so any window length is safe.
    pub fn remaining_in(&self, window: Duration, now: MonotonicInstant) -> Duration {
        window.saturating_sub(now.duration_since(*self))
    }

    /// True when strictly more than `window` has passed between `self` and `now`
    pub fn expired_by(&self, now: MonotonicInstant, window: Duration) -> bool {
        now.duration_since(*self) > window
    }
}

/// Panics on overflow, like `Instant + Duration`. Timeout checks go through
/// `expired_by` and `remaining_in` instead.
impl std::ops::Add<Duration> for MonotonicInstant {
    type Output = MonotonicInstant;

    fn add(self, rhs: Duration) -> Self::Output {
        MonotonicInstant(self.0 + rhs)
    }
}
