use core::time::Duration;
use std::sync::Arc;

/// Sonyflake default start time: Monday, September 1, 2014 00:00:00 UTC
pub const SONYFLAKE_EPOCH: Duration = Duration::from_millis(1_409_529_600_000);

/// Custom epoch: Wednesday, January 1, 2025 00:00:00 UTC
pub const CUSTOM_EPOCH: Duration = Duration::from_millis(1_735_689_600_000);

/// A trait for time sources that return the current wall-clock time.
///
/// This abstraction allows you to plug in the real system clock, a clock that
/// never goes backwards, or a mocked time source in tests.
///
/// The returned value is the time elapsed since the UNIX epoch
/// (1970-01-01T00:00:00Z). Generators convert it to ticks relative to their
/// own start time.
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use sonyflake::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_time(&self) -> Duration {
///         Duration::from_millis(1234)
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_time(), Duration::from_millis(1234));
/// ```
pub trait TimeSource {
    /// Returns the current time as a duration since the UNIX epoch.
    fn current_time(&self) -> Duration;
}

impl<T> TimeSource for &T
where
    T: TimeSource + ?Sized,
{
    fn current_time(&self) -> Duration {
        (**self).current_time()
    }
}

impl<T> TimeSource for Arc<T>
where
    T: TimeSource + ?Sized,
{
    fn current_time(&self) -> Duration {
        (**self).current_time()
    }
}
