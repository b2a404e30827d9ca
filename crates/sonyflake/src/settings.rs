use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{Error, Result, SONYFLAKE_EPOCH, SonyflakeId};

/// What a generator does when the clock reports a tick earlier than the last
/// one it issued an ID for.
///
/// A generator never emits an ID that is not strictly greater than the
/// previous one; the policy only decides between failing and waiting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClockRegressionPolicy {
    /// Return [`Error::ClockRegression`] immediately. The generator state is
    /// untouched, so calls succeed again once the clock catches up.
    #[default]
    FailFast,
    /// Wait for the clock to catch up if it is behind by at most `max_skew`,
    /// otherwise return [`Error::ClockRegression`].
    Wait {
        /// The largest regression that is waited out.
        max_skew: Duration,
    },
}

/// Immutable generator configuration: the start time (epoch) that elapsed
/// ticks are counted from, the machine ID embedded in every ID, and the
/// [`ClockRegressionPolicy`].
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use sonyflake::{ClockRegressionPolicy, Settings};
///
/// let settings = Settings::new(Duration::from_secs(1_735_689_600))
///     .with_machine_id(42)?
///     .with_clock_regression_policy(ClockRegressionPolicy::Wait {
///         max_skew: Duration::from_millis(50),
///     });
///
/// assert_eq!(settings.machine_id(), 42);
/// assert!(Settings::default().with_machine_id(70_000).is_err());
/// # Ok::<(), sonyflake::Error>(())
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Settings {
    start_time: Duration,
    machine_id: u16,
    clock_regression_policy: ClockRegressionPolicy,
}

impl Default for Settings {
    /// Settings with the [`SONYFLAKE_EPOCH`] start time and machine ID `0`.
    fn default() -> Self {
        Self::new(SONYFLAKE_EPOCH)
    }
}

impl Settings {
    /// Creates settings with the given start time (a duration since the UNIX
    /// epoch), machine ID `0` and [`ClockRegressionPolicy::FailFast`].
    pub const fn new(start_time: Duration) -> Self {
        Self {
            start_time,
            machine_id: 0,
            clock_regression_policy: ClockRegressionPolicy::FailFast,
        }
    }

    /// Creates settings from a wall-clock instant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `start_time` lies before the
    /// UNIX epoch.
    pub fn from_system_time(start_time: SystemTime) -> Result<Self> {
        let start_time =
            start_time
                .duration_since(UNIX_EPOCH)
                .map_err(|_| Error::InvalidConfiguration {
                    reason: "start time is before the UNIX epoch".to_owned(),
                })?;
        Ok(Self::new(start_time))
    }

    /// Sets the machine ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if `machine_id` does not fit in
    /// the 16-bit machine ID field.
    pub fn with_machine_id(self, machine_id: u64) -> Result<Self> {
        let machine_id =
            u16::try_from(machine_id).map_err(|_| Error::InvalidConfiguration {
                reason: format!(
                    "machine id {machine_id} exceeds {}",
                    SonyflakeId::max_machine_id()
                ),
            })?;
        Ok(Self {
            machine_id,
            ..self
        })
    }

    /// Sets the clock regression policy.
    pub const fn with_clock_regression_policy(self, policy: ClockRegressionPolicy) -> Self {
        Self {
            clock_regression_policy: policy,
            ..self
        }
    }

    /// The start time as a duration since the UNIX epoch.
    pub const fn start_time(&self) -> Duration {
        self.start_time
    }

    /// The machine ID embedded in every generated ID.
    pub const fn machine_id(&self) -> u16 {
        self.machine_id
    }

    /// The clock regression policy.
    pub const fn clock_regression_policy(&self) -> ClockRegressionPolicy {
        self.clock_regression_policy
    }

    /// Rejects a start time later than `now` (a duration since the UNIX
    /// epoch).
    pub(crate) fn validate(&self, now: Duration) -> Result<()> {
        if self.start_time > now {
            return Err(Error::InvalidConfiguration {
                reason: format!(
                    "start time {}ms is {}ms in the future",
                    self.start_time.as_millis(),
                    (self.start_time - now).as_millis()
                ),
            });
        }
        Ok(())
    }

    /// The elapsed time since the start time encoded in `id`.
    pub const fn elapsed_time(&self, id: SonyflakeId) -> Duration {
        id.elapsed_time()
    }

    /// The wall-clock instant `id` was minted at, truncated to its tick.
    ///
    /// # Panics
    ///
    /// Panics if the instant overflows [`SystemTime`]. Validated settings
    /// never do; see [`Self::checked_timestamp`] otherwise.
    pub fn timestamp(&self, id: SonyflakeId) -> SystemTime {
        id.timestamp(self.start_time)
    }

    /// Like [`Self::timestamp`], but returns `None` on overflow.
    pub fn checked_timestamp(&self, id: SonyflakeId) -> Option<SystemTime> {
        id.checked_timestamp(self.start_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.start_time(), SONYFLAKE_EPOCH);
        assert_eq!(settings.machine_id(), 0);
        assert_eq!(
            settings.clock_regression_policy(),
            ClockRegressionPolicy::FailFast
        );
    }

    #[test]
    fn machine_id_range_is_checked() {
        let settings = Settings::default();
        assert_eq!(settings.with_machine_id(65_535).unwrap().machine_id(), 65_535);
        assert!(matches!(
            settings.with_machine_id(65_536),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn from_system_time_rejects_pre_unix_instants() {
        let before = UNIX_EPOCH - Duration::from_secs(1);
        assert!(matches!(
            Settings::from_system_time(before),
            Err(Error::InvalidConfiguration { .. })
        ));

        let at = UNIX_EPOCH + Duration::from_secs(1_621_209_600);
        assert_eq!(
            Settings::from_system_time(at).unwrap().start_time(),
            Duration::from_secs(1_621_209_600)
        );
    }

    #[test]
    fn future_start_time_is_rejected() {
        let settings = Settings::new(Duration::from_secs(100));
        assert!(settings.validate(Duration::from_secs(100)).is_ok());
        assert!(settings.validate(Duration::from_secs(101)).is_ok());
        assert!(matches!(
            settings.validate(Duration::from_secs(99)),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn timestamp_uses_start_time() {
        let settings = Settings::new(Duration::from_secs(1_000));
        let id = SonyflakeId::from(250, 0, 0);
        assert_eq!(settings.elapsed_time(id), Duration::from_millis(2_500));
        assert_eq!(
            settings.timestamp(id),
            UNIX_EPOCH + Duration::from_millis(1_002_500)
        );
        assert_eq!(settings.checked_timestamp(id), Some(settings.timestamp(id)));
    }

    #[test]
    fn checked_timestamp_of_unvalidated_start_time() {
        let settings = Settings::new(Duration::MAX);
        assert_eq!(settings.checked_timestamp(SonyflakeId::from(1, 0, 0)), None);
    }
}
