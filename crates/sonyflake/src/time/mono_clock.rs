use core::time::Duration;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::TimeSource;

/// A monotonic time source that samples the wall clock once and then advances
/// with [`Instant`].
///
/// This avoids wall-clock adjustments (e.g., NTP corrections) while still
/// reporting time relative to the UNIX epoch, so generators using it never
/// observe a clock regression. The trade-off is drift: over long uptimes the
/// reported time can move away from the system clock.
///
/// Clones share the same anchor and therefore agree with each other.
///
/// # Example
///
/// ```
/// use sonyflake::{MonotonicClock, TimeSource};
///
/// let clock = MonotonicClock::new();
/// let a = clock.current_time();
/// let b = clock.current_time();
/// assert!(b >= a);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    wall: Duration,
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Anchors a new clock to the current system time.
    ///
    /// A system clock set before 1970 anchors at zero.
    pub fn new() -> Self {
        let start = Instant::now();
        let wall = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self { wall, start }
    }

    /// Anchors a clock at an explicit wall-clock time (since the UNIX epoch)
    /// instead of the system time.
    pub fn with_anchor(wall: Duration) -> Self {
        Self {
            wall,
            start: Instant::now(),
        }
    }
}

impl TimeSource for MonotonicClock {
    /// Returns the anchor time plus the monotonic time elapsed since
    /// construction.
    fn current_time(&self) -> Duration {
        self.wall + self.start.elapsed()
    }
}
