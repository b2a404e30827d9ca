use core::time::Duration;

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Result, Settings, SonyflakeId, SystemClock, TimeSource,
    generator::{Poll, SonyflakeGenerator, tick},
};

/// State word meaning "no ID issued yet". The reserved bit is set, so no
/// valid ID can collide with it.
const NONE: u64 = u64::MAX;

/// A lock-free Sonyflake generator suitable for multi-threaded environments.
///
/// The last issued ID is kept in a single [`AtomicU64`] and advanced with a
/// compare-and-swap. The state is loaded before the clock is read, so a
/// thread can never see a tick newer than its own clock reading on a clock
/// that does not regress.
///
/// ## Features
/// - ✅ Thread-safe
/// - ❌ Fair access across threads: a thread that loses the CAS race gets
///   [`Poll::Pending`] with a zero duration and retries
///
/// ## See Also
/// - [`LockSonyflakeGenerator`]
///
/// [`LockSonyflakeGenerator`]: crate::LockSonyflakeGenerator
pub struct AtomicSonyflakeGenerator<T = SystemClock>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
    settings: Settings,
    time: T,
}

impl AtomicSonyflakeGenerator<SystemClock> {
    /// Creates a generator reading the system wall clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the start time lies in the
    /// future.
    ///
    /// [`Error::InvalidConfiguration`]: crate::Error::InvalidConfiguration
    pub fn from_settings(settings: Settings) -> Result<Self> {
        Self::new(settings, SystemClock)
    }
}

impl<T> AtomicSonyflakeGenerator<T>
where
    T: TimeSource,
{
    /// Creates a new [`AtomicSonyflakeGenerator`] that has not issued any ID
    /// yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the start time is later than
    /// the current time reported by `time`.
    ///
    /// # Example
    /// ```
    /// use sonyflake::{AtomicSonyflakeGenerator, MonotonicClock, Settings, CUSTOM_EPOCH};
    ///
    /// let settings = Settings::new(CUSTOM_EPOCH).with_machine_id(3)?;
    /// let generator = AtomicSonyflakeGenerator::new(settings, MonotonicClock::new())?;
    ///
    /// let a = generator.next_id()?;
    /// let b = generator.next_id()?;
    /// assert!(a < b);
    /// # Ok::<(), sonyflake::Error>(())
    /// ```
    ///
    /// [`Error::InvalidConfiguration`]: crate::Error::InvalidConfiguration
    pub fn new(settings: Settings, time: T) -> Result<Self> {
        settings.validate(time.current_time())?;
        Ok(Self::from_state(settings, None, time))
    }

    /// Creates a generator whose last issued ID is `last`. The settings are
    /// not validated.
    pub fn from_state(settings: Settings, last: Option<SonyflakeId>, time: T) -> Self {
        let initial = last.map_or(NONE, |id| id.to_raw());
        Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(AtomicU64::new(initial)),
            #[cfg(not(feature = "cache-padded"))]
            state: AtomicU64::new(initial),
            settings,
            time,
        }
    }

    /// The settings this generator was created with.
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Generates the next ID, sleeping until the next tick boundary when the
    /// current tick is exhausted and yielding when a CAS race is lost.
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
    /// If the CAS fails because another thread won the race,
    /// `Poll::Pending { yield_for: Duration::ZERO }` is returned to retry
    /// immediately.
    ///
    /// # Errors
    /// - [`Error::ClockRegression`] if the clock is behind the last tick and
    ///   the policy does not allow waiting
    /// - [`Error::TimeRangeExhausted`] if the elapsed time no longer fits
    ///
    /// [`Error::ClockRegression`]: crate::Error::ClockRegression
    /// [`Error::TimeRangeExhausted`]: crate::Error::TimeRangeExhausted
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_poll_id(&self) -> Result<Poll> {
        let current_raw = self.state.load(Ordering::Acquire);
        let last = (current_raw != NONE).then(|| SonyflakeId::from_raw(current_raw));

        let now = self.time.current_time();
        let outcome = tick::advance(&self.settings, last, now);
        let next_id = match outcome {
            Ok(tick::Step::Emit(id)) => id,
            _ => {
                tick::record(&outcome);
                return outcome.map(tick::Step::into_poll);
            }
        };

        if self
            .state
            .compare_exchange(
                current_raw,
                next_id.to_raw(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_ok()
        {
            Ok(Poll::Ready { id: next_id })
        } else {
            // Another thread won the race. Yield 0 to retry immediately.
            Ok(Poll::Pending {
                yield_for: Duration::ZERO,
            })
        }
    }
}

impl<T> SonyflakeGenerator<T> for AtomicSonyflakeGenerator<T>
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
