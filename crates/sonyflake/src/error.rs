/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `sonyflake` can emit.
///
/// Construction errors ([`Error::InvalidConfiguration`]) mean no generator was
/// created. Per-call errors ([`Error::ClockRegression`],
/// [`Error::TimeRangeExhausted`]) leave the generator state untouched: no ID is
/// emitted and the next call starts from the same state.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The settings cannot be used to build a generator, e.g. the start time
    /// lies in the future or the machine ID does not fit in 16 bits.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Human readable description of the rejected value.
        reason: String,
    },

    /// The clock reports a tick earlier than the last tick this generator
    /// issued an ID for.
    ///
    /// Returned immediately under [`ClockRegressionPolicy::FailFast`], or once
    /// the regression exceeds the tolerated skew under
    /// [`ClockRegressionPolicy::Wait`]. A clock reading before the start time
    /// is reported with `current_tick: 0`.
    ///
    /// [`ClockRegressionPolicy::FailFast`]: crate::ClockRegressionPolicy::FailFast
    /// [`ClockRegressionPolicy::Wait`]: crate::ClockRegressionPolicy::Wait
    #[error("clock moved backwards: last tick {last_tick}, current tick {current_tick}")]
    ClockRegression {
        /// The tick of the last issued ID.
        last_tick: u64,
        /// The tick observed now.
        current_tick: u64,
    },

    /// The elapsed time no longer fits in the 39-bit time field. The generator
    /// is exhausted for its start time and the epoch must be rotated.
    #[error("elapsed ticks {elapsed_ticks} exceed the 39-bit time field")]
    TimeRangeExhausted {
        /// The tick that did not fit.
        elapsed_ticks: u64,
    },

    /// The operation failed because the lock was **poisoned**.
    ///
    /// This occurs when a thread panics while holding the lock. When the
    /// `parking-lot` feature is enabled, mutexes do **not** poison, so this
    /// variant is not available.
    #[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
    #[cfg(not(feature = "parking-lot"))]
    #[error("generator lock poisoned")]
    LockPoisoned,

    /// No machine ID could be derived from the host's network configuration.
    #[error("machine id unavailable: {reason}")]
    MachineIdUnavailable {
        /// Why discovery failed.
        reason: String,
    },

    /// A raw value has the reserved bit set (or is negative) and is not a
    /// Sonyflake ID.
    #[error("invalid sonyflake id: {raw}")]
    InvalidId {
        /// The rejected raw value.
        raw: i128,
    },
}

#[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg_attr(docsrs, doc(cfg(not(feature = "parking-lot"))))]
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
