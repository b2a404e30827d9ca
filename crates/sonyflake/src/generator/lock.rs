use core::time::Duration;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Result, Settings, SonyflakeId, SystemClock, TimeSource,
    generator::{Mutex, Poll, SonyflakeGenerator, tick},
};

/// A lock-based Sonyflake generator suitable for multi-threaded environments.
///
/// The `{last tick, sequence}` state lives behind a single mutex. The clock is
/// read inside the critical section, so concurrent callers can never observe
/// each other's ticks out of order. The only blocking outside the lock is the
/// sleep until the next tick once all 256 sequence numbers are used.
///
/// Clones share the same state and therefore never produce duplicate IDs.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Fair access across threads
///
/// ## See Also
/// - [`AtomicSonyflakeGenerator`]
///
/// [`AtomicSonyflakeGenerator`]: crate::AtomicSonyflakeGenerator
pub struct LockSonyflakeGenerator<T = SystemClock>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    pub(crate) state: Arc<crossbeam_utils::CachePadded<Mutex<Option<SonyflakeId>>>>,
    #[cfg(not(feature = "cache-padded"))]
    pub(crate) state: Arc<Mutex<Option<SonyflakeId>>>,
    pub(crate) settings: Settings,
    pub(crate) time: T,
}

impl LockSonyflakeGenerator<SystemClock> {
    /// Creates a generator reading the system wall clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the start time lies in the
    /// future.
    ///
    /// # Example
    /// ```
    /// use core::time::Duration;
    /// use sonyflake::{LockSonyflakeGenerator, Settings};
    ///
    /// // 2021-05-17T00:00:00Z
    /// let settings = Settings::new(Duration::from_secs(1_621_209_600)).with_machine_id(1)?;
    /// let generator = LockSonyflakeGenerator::from_settings(settings)?;
    ///
    /// let id = generator.next_id()?;
    /// assert_eq!(id.machine_id(), 1);
    /// # Ok::<(), sonyflake::Error>(())
    /// ```
    ///
    /// [`Error::InvalidConfiguration`]: crate::Error::InvalidConfiguration
    pub fn from_settings(settings: Settings) -> Result<Self> {
        Self::new(settings, SystemClock)
    }
}

impl<T> LockSonyflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new [`LockSonyflakeGenerator`] that has not issued any ID
    /// yet.
    ///
    /// # Parameters
    ///
    /// - `settings`: The start time, machine ID and clock regression policy.
    /// - `time`: A [`TimeSource`] implementation (e.g., [`SystemClock`] or
    ///   [`MonotonicClock`]) that determines how timestamps are generated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the start time is later than
    /// the current time reported by `time`.
    ///
    /// [`MonotonicClock`]: crate::MonotonicClock
    /// [`Error::InvalidConfiguration`]: crate::Error::InvalidConfiguration
    pub fn new(settings: Settings, time: T) -> Result<Self> {
        settings.validate(time.current_time())?;
        Ok(Self::from_state(settings, None, time))
    }

    /// Creates a generator whose last issued ID is `last`.
    ///
    /// Useful when the caller persists the last issued ID and wants the
    /// generator to continue strictly after it. The settings are not
    /// validated.
    pub fn from_state(settings: Settings, last: Option<SonyflakeId>, time: T) -> Self {
        Self {
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(Mutex::new(last))),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(Mutex::new(last)),
            settings,
            time,
        }
    }

    /// The settings this generator was created with.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Generates the next ID, sleeping until the next tick boundary when the
    /// current tick is exhausted.
    ///
    /// # Errors
    ///
    /// See [`Self::try_poll_id`].
    pub fn next_id(&self) -> Result<SonyflakeId> {
        SonyflakeGenerator::next_id(self)
    }

    /// Generates the next ID, calling `f` with the duration to wait whenever
    /// the generator is pending.
    ///
    /// # Errors
    ///
    /// See [`Self::try_poll_id`].
    pub fn try_next_id(&self, f: impl FnMut(Duration)) -> Result<SonyflakeId> {
        SonyflakeGenerator::try_next_id(self, f)
    }

    /// Attempts to generate the next ID.
    ///
    /// # Returns
    /// - `Ok(Poll::Ready { id })`: A new ID is available
    /// - `Ok(Poll::Pending { yield_for })`: The time to wait before trying
    ///   again
    /// - `Err(e)`: clock regression, exhausted time range, or poisoned lock
    ///
    /// # Errors
    /// - [`Error::ClockRegression`] if the clock is behind the last tick and
    ///   the policy does not allow waiting
    /// - [`Error::TimeRangeExhausted`] if the elapsed time no longer fits
    /// - [`Error::LockPoisoned`] if the underlying lock has been poisoned
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    /// [`Error::TimeRangeExhausted`]: crate::Error::TimeRangeExhausted
    /// [`Error::LockPoisoned`]: crate::Error::LockPoisoned
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<Poll> {
        let outcome = {
            let mut last = {
                #[cfg(feature = "parking-lot")]
                {
                    self.state.lock()
                }
                #[cfg(not(feature = "parking-lot"))]
                {
                    self.state.lock()?
                }
            };

            let now = self.time.current_time();
            let outcome = tick::advance(&self.settings, *last, now);
            if let Ok(tick::Step::Emit(id)) = outcome {
                *last = Some(id);
            }
            outcome
        };

        // Guard is dropped; logging may block on the subscriber.
        tick::record(&outcome);
        outcome.map(tick::Step::into_poll)
    }
}

impl<T> Clone for LockSonyflakeGenerator<T>
where
    T: TimeSource + Clone,
{
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            settings: self.settings,
            time: self.time.clone(),
        }
    }
}

impl<T> SonyflakeGenerator<T> for LockSonyflakeGenerator<T>
where
    T: TimeSource,
{
    fn new(settings: Settings, time: T) -> Result<Self> {
        Self::new(settings, time)
    }

    fn settings(&self) -> &Settings {
        self.settings()
    }

    fn try_poll_id(&self) -> Result<Poll> {
        self.try_poll_id()
    }
}
