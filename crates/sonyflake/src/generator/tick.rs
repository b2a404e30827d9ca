use core::cmp::Ordering;
use core::time::Duration;

use crate::{ClockRegressionPolicy, Error, Poll, Result, Settings, SonyflakeId};

/// The outcome of advancing the generator state by one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Store and return this ID.
    Emit(SonyflakeId),
    /// All sequence numbers of `tick` are used; retry once the next tick
    /// starts.
    Exhausted { tick: u64, yield_for: Duration },
    /// The clock is behind the last tick by `yield_for`, within the tolerated
    /// skew.
    Behind {
        last_tick: u64,
        current_tick: u64,
        yield_for: Duration,
    },
}

impl Step {
    pub(crate) const fn into_poll(self) -> Poll {
        match self {
            Self::Emit(id) => Poll::Ready { id },
            Self::Exhausted { yield_for, .. } | Self::Behind { yield_for, .. } => {
                Poll::Pending { yield_for }
            }
        }
    }
}

/// Computes the next state from the last issued ID and the current time.
///
/// `now` is the clock reading (since the UNIX epoch). `last` is `None` until
/// the first ID has been issued. Every emitted ID carries the machine ID of
/// `settings`, whatever `last` was minted with. This function is pure and
/// never logs; callers hold the lock (or CAS on the state word) around it and
/// pass the outcome to [`record`] afterwards.
pub(crate) fn advance(
    settings: &Settings,
    last: Option<SonyflakeId>,
    now: Duration,
) -> Result<Step> {
    let Some(elapsed) = now.checked_sub(settings.start_time()) else {
        return Err(Error::ClockRegression {
            last_tick: last.map_or(0, |id| id.elapsed_ticks()),
            current_tick: 0,
        });
    };
    let current_tick = ticks(elapsed);
    if current_tick > SonyflakeId::max_elapsed_ticks() {
        return Err(Error::TimeRangeExhausted {
            elapsed_ticks: current_tick,
        });
    }

    let machine_id = settings.machine_id();
    let Some(last) = last else {
        return Ok(Step::Emit(SonyflakeId::from_components(
            current_tick,
            machine_id,
            0,
        )));
    };

    let last_tick = last.elapsed_ticks();
    match current_tick.cmp(&last_tick) {
        Ordering::Equal if last.has_sequence_room() => Ok(Step::Emit(
            SonyflakeId::from_components(current_tick, machine_id, last.sequence() + 1),
        )),
        Ordering::Equal => Ok(Step::Exhausted {
            tick: current_tick,
            yield_for: until_tick(elapsed, current_tick + 1),
        }),
        Ordering::Greater => Ok(Step::Emit(SonyflakeId::from_components(
            current_tick,
            machine_id,
            0,
        ))),
        Ordering::Less => cold_clock_behind(settings, elapsed, last_tick, current_tick),
    }
}

/// Number of whole ticks in `elapsed` (floor).
pub(crate) fn ticks(elapsed: Duration) -> u64 {
    let ticks = elapsed.as_millis() / SonyflakeId::TICK.as_millis();
    u64::try_from(ticks).unwrap_or(u64::MAX)
}

/// The exact time from `elapsed` until `tick` starts.
fn until_tick(elapsed: Duration, tick: u64) -> Duration {
    Duration::from_millis(tick * 10).saturating_sub(elapsed)
}

#[cold]
#[inline(never)]
fn cold_clock_behind(
    settings: &Settings,
    elapsed: Duration,
    last_tick: u64,
    current_tick: u64,
) -> Result<Step> {
    let behind = until_tick(elapsed, last_tick);
    debug_assert!(behind > Duration::ZERO);

    match settings.clock_regression_policy() {
        ClockRegressionPolicy::Wait { max_skew } if behind <= max_skew => Ok(Step::Behind {
            last_tick,
            current_tick,
            yield_for: behind,
        }),
        _ => Err(Error::ClockRegression {
            last_tick,
            current_tick,
        }),
    }
}

/// Logs the outcome of [`advance`]. Must be called after the state lock is
/// released.
#[inline]
pub(crate) fn record(outcome: &Result<Step>) {
    #[cfg(feature = "tracing")]
    {
        match outcome {
            Ok(Step::Emit(_)) => {}
            Ok(Step::Exhausted { tick, yield_for }) => {
                tracing::debug!(tick, ?yield_for, "sequence exhausted, waiting for next tick");
            }
            Ok(Step::Behind {
                last_tick,
                current_tick,
                yield_for,
            }) => {
                tracing::warn!(last_tick, current_tick, ?yield_for, "clock moved backwards, waiting");
            }
            Err(e) => tracing::warn!(error = %e, "failed to generate id"),
        }
    }
    #[cfg(not(feature = "tracing"))]
    let _ = outcome;
}
