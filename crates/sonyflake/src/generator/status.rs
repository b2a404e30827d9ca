use core::time::Duration;

use crate::SonyflakeId;

/// Represents the result of one attempt to generate a new ID.
///
/// This type models the outcome of `SonyflakeGenerator::try_poll_id()`:
///
/// - [`Poll::Ready`] indicates a new ID was successfully generated.
/// - [`Poll::Pending`] means the generator cannot produce a new ID right now.
///   This happens when all 256 sequence numbers of the current tick are used,
///   when the clock is behind the last tick and the policy is to wait, or
///   (for the atomic generator) when another thread won the race.
///
/// This allows non-blocking generation loops and custom backoff strategies.
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use sonyflake::{LockSonyflakeGenerator, Poll, Settings, TimeSource};
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_time(&self) -> Duration {
///         Duration::from_secs(1_800_000_000)
///     }
/// }
///
/// let generator = LockSonyflakeGenerator::new(Settings::default(), FixedTime)?;
/// match generator.try_poll_id()? {
///     Poll::Ready { id } => println!("ID: {id}"),
///     Poll::Pending { yield_for } => println!("Back off for: {yield_for:?}"),
/// }
/// # Ok::<(), sonyflake::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// A unique ID was generated and is ready to use.
    Ready {
        /// The generated ID.
        id: SonyflakeId,
    },
    /// No ID could be generated right now.
    ///
    /// Wait for `yield_for` before attempting again. A zero duration means
    /// "retry immediately".
    Pending {
        /// How long until an ID can be generated, at most one tick for an
        /// exhausted sequence.
        yield_for: Duration,
    },
}
