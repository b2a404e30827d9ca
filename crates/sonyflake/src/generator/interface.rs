use core::time::Duration;
use std::time::SystemTime;

use crate::{Poll, Result, Settings, SonyflakeId, TimeSource};

/// A minimal interface for generating Sonyflake IDs.
///
/// Implementations hold the immutable [`Settings`] and the mutable
/// `{last tick, sequence}` state. All methods take `&self`; thread safety is
/// up to the implementation.
pub trait SonyflakeGenerator<T>
where
    Self: Sized,
    T: TimeSource,
{
    /// Creates a new generator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the start time is later than
    /// the current time reported by `time`.
    ///
    /// [`Error::InvalidConfiguration`]: crate::Error::InvalidConfiguration
    fn new(settings: Settings, time: T) -> Result<Self>;

    /// The settings this generator was created with.
    fn settings(&self) -> &Settings;

    /// Attempts to generate the next available ID without blocking.
    ///
    /// The returned [`Poll`] contains either:
    /// - the newly generated ID, or
    /// - a duration to yield/sleep before trying again.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if the clock is behind the last issued
    ///   tick and the policy does not allow waiting
    /// - [`Error::TimeRangeExhausted`] if the elapsed time no longer fits
    /// - [`Error::LockPoisoned`] if the underlying lock is poisoned
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    /// [`Error::TimeRangeExhausted`]: crate::Error::TimeRangeExhausted
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    fn try_poll_id(&self) -> Result<Poll>;

    /// Generates the next ID, calling `f` with the duration to wait whenever
    /// the generator is pending.
    ///
    /// `f` decides how to wait (sleep, spin, advance a mock clock, ...). It is
    /// called outside of any lock.
    ///
    /// # Errors
    ///
    /// See [`Self::try_poll_id`].
    fn try_next_id(&self, mut f: impl FnMut(Duration)) -> Result<SonyflakeId> {
        loop {
            match self.try_poll_id()? {
                Poll::Ready { id } => break Ok(id),
                Poll::Pending { yield_for } => f(yield_for),
            }
        }
    }

    /// Generates the next ID, putting the calling thread to sleep until the
    /// next tick boundary when the current tick is exhausted.
    ///
    /// # Errors
    ///
    /// See [`Self::try_poll_id`].
    fn next_id(&self) -> Result<SonyflakeId> {
        self.try_next_id(sleep)
    }

    /// Number of 10 ms ticks between the start time and the creation of `id`.
    fn elapsed_ticks(&self, id: SonyflakeId) -> u64 {
        id.elapsed_ticks()
    }

    /// The sequence number of `id` within its tick.
    fn sequence_number(&self, id: SonyflakeId) -> u8 {
        id.sequence()
    }

    /// The machine ID encoded in `id`.
    fn machine_id(&self, id: SonyflakeId) -> u16 {
        id.machine_id()
    }

    /// The wall-clock instant `id` was minted at, truncated to its tick.
    ///
    /// # Panics
    ///
    /// Panics if the instant overflows [`SystemTime`]. Validated settings
    /// never do.
    fn timestamp(&self, id: SonyflakeId) -> SystemTime {
        self.settings().timestamp(id)
    }
}

/// Blocking wait used by [`SonyflakeGenerator::next_id`].
pub(crate) fn sleep(yield_for: Duration) {
    if yield_for.is_zero() {
        std::thread::yield_now();
    } else {
        std::thread::sleep(yield_for);
    }
}
