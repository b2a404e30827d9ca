use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::TimeSource;

/// The system wall clock. This is the default [`TimeSource`] of every
/// generator.
///
/// Wall-clock time may jump backwards (NTP corrections, manual changes).
/// Generators detect this and apply their [`ClockRegressionPolicy`]; use
/// [`MonotonicClock`] to rule it out entirely.
///
/// A system clock set before 1970 reads as zero.
///
/// [`ClockRegressionPolicy`]: crate::ClockRegressionPolicy
/// [`MonotonicClock`]: crate::MonotonicClock
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_time(&self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}
