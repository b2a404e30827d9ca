use core::fmt;
use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{Error, Parts, Result};

/// A 63-bit Sonyflake ID.
///
/// - 1 bit reserved (always zero, so the ID is a non-negative `i64`)
/// - 39 bits elapsed time, in 10 ms ticks since the generator's start time
/// - 8 bits sequence
/// - 16 bits machine ID
///
/// ```text
///  Bit Index:  63           63 62                24 23            16 15              0
///              +--------------+--------------------+----------------+-----------------+
///  Field:      | reserved (1) | elapsed ticks (39) |  sequence (8)  | machine ID (16) |
///              +--------------+--------------------+----------------+-----------------+
///              |<------------ MSB ------------ 64 bits ------------ LSB ------------->|
/// ```
///
/// The elapsed time is only meaningful together with the start time (epoch)
/// of the generator that produced the ID, see [`SonyflakeId::timestamp`].
///
/// # Example
///
/// ```
/// use sonyflake::SonyflakeId;
///
/// let id = SonyflakeId::from(1000, 7, 3);
/// assert_eq!(id.elapsed_ticks(), 1000);
/// assert_eq!(id.machine_id(), 7);
/// assert_eq!(id.sequence(), 3);
/// assert_eq!(id.to_raw(), (1000 << 24) | (3 << 16) | 7);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SonyflakeId {
    id: u64,
}

impl SonyflakeId {
    /// Width of the elapsed-time field.
    pub const BITS_TIME: u32 = 39;

    /// Width of the sequence field.
    pub const BITS_SEQUENCE: u32 = 8;

    /// Width of the machine ID field.
    pub const BITS_MACHINE_ID: u32 = 16;

    /// Bitmask for extracting the 39-bit elapsed-time field. Occupies bits 24
    /// through 62.
    pub const TIMESTAMP_MASK: u64 = (1 << Self::BITS_TIME) - 1;

    /// Bitmask for extracting the 8-bit sequence field. Occupies bits 16
    /// through 23.
    pub const SEQUENCE_MASK: u64 = (1 << Self::BITS_SEQUENCE) - 1;

    /// Bitmask for extracting the 16-bit machine ID field. Occupies bits 0
    /// through 15.
    pub const MACHINE_ID_MASK: u64 = (1 << Self::BITS_MACHINE_ID) - 1;

    /// Number of bits to shift the elapsed time to its correct position.
    pub const TIMESTAMP_SHIFT: u32 = Self::BITS_SEQUENCE + Self::BITS_MACHINE_ID;

    /// Number of bits to shift the sequence to its correct position.
    pub const SEQUENCE_SHIFT: u32 = Self::BITS_MACHINE_ID;

    /// Number of bits to shift the machine ID (bit 0).
    pub const MACHINE_ID_SHIFT: u32 = 0;

    /// The time unit of the elapsed-time field.
    pub const TICK: Duration = Duration::from_millis(10);

    /// The reserved most significant bit.
    const SIGN_BIT: u64 = 1 << 63;

    /// Packs the three fields into an ID. Out-of-range values are masked to
    /// their field width.
    pub const fn from(elapsed_ticks: u64, machine_id: u16, sequence: u8) -> Self {
        let elapsed_ticks = (elapsed_ticks & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let sequence = (sequence as u64 & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        let machine_id = (machine_id as u64 & Self::MACHINE_ID_MASK) << Self::MACHINE_ID_SHIFT;
        Self {
            id: elapsed_ticks | sequence | machine_id,
        }
    }

    /// Packs the three fields into an ID.
    ///
    /// Unlike [`Self::from`], this asserts (in debug builds) that every
    /// component fits its field instead of silently masking it.
    pub fn from_components(elapsed_ticks: u64, machine_id: u16, sequence: u8) -> Self {
        debug_assert!(
            elapsed_ticks <= Self::TIMESTAMP_MASK,
            "elapsed ticks overflow"
        );
        Self::from(elapsed_ticks, machine_id, sequence)
    }

    /// Extracts the number of 10 ms ticks since the start time.
    ///
    /// The field is top-aligned below the reserved bit, so for any valid ID no
    /// masking is needed beyond the shift.
    pub const fn elapsed_ticks(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    /// Extracts the per-tick sequence number.
    pub const fn sequence(&self) -> u8 {
        ((self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK) as u8
    }

    /// Extracts the machine ID.
    pub const fn machine_id(&self) -> u16 {
        ((self.id >> Self::MACHINE_ID_SHIFT) & Self::MACHINE_ID_MASK) as u16
    }

    /// Returns the largest representable elapsed-tick value (~174 years).
    pub const fn max_elapsed_ticks() -> u64 {
        Self::TIMESTAMP_MASK
    }

    /// Returns the largest sequence value before the tick is exhausted.
    pub const fn max_sequence() -> u8 {
        Self::SEQUENCE_MASK as u8
    }

    /// Returns the largest machine ID.
    pub const fn max_machine_id() -> u16 {
        Self::MACHINE_ID_MASK as u16
    }

    /// Returns the elapsed time since the start time.
    pub const fn elapsed_time(&self) -> Duration {
        Duration::from_millis(self.elapsed_ticks() * 10)
    }

    /// Returns the wall-clock instant this ID was minted at, given the start
    /// time (as a duration since the UNIX epoch) of the generator that
    /// produced it.
    ///
    /// The result is truncated to the 10 ms tick.
    ///
    /// # Panics
    ///
    /// Panics if the instant is not representable by [`SystemTime`], which
    /// can only happen for a start time far outside the supported range. See
    /// [`Self::checked_timestamp`] for a non-panicking version.
    pub fn timestamp(&self, start_time: Duration) -> SystemTime {
        UNIX_EPOCH + start_time + self.elapsed_time()
    }

    /// Like [`Self::timestamp`], but returns `None` instead of panicking when
    /// the instant overflows [`SystemTime`].
    pub fn checked_timestamp(&self, start_time: Duration) -> Option<SystemTime> {
        UNIX_EPOCH
            .checked_add(start_time)?
            .checked_add(self.elapsed_time())
    }

    /// Returns `true` if the reserved bit is clear.
    pub const fn is_valid(&self) -> bool {
        self.id & Self::SIGN_BIT == 0
    }

    /// Returns true if the current sequence value can be incremented.
    pub const fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::max_sequence()
    }

    /// Returns a new ID in the same tick with the sequence incremented.
    pub fn increment_sequence(&self) -> Self {
        debug_assert!(self.has_sequence_room(), "sequence overflow");
        Self::from(self.elapsed_ticks(), self.machine_id(), self.sequence() + 1)
    }

    /// Returns a new ID for a later tick with the sequence reset to zero.
    pub fn rollover_to_tick(&self, elapsed_ticks: u64) -> Self {
        Self::from_components(elapsed_ticks, self.machine_id(), 0)
    }

    /// Splits the ID into its fields.
    pub const fn decompose(&self) -> Parts {
        Parts {
            id: self.id,
            msb: self.id >> 63,
            elapsed_ticks: self.elapsed_ticks(),
            sequence: self.sequence(),
            machine_id: self.machine_id(),
        }
    }

    /// Converts this type into its raw representation.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Converts a raw value into this type without validation.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the ID as a zero-padded 19-digit string, which sorts
    /// lexicographically in the same order as the numeric value.
    pub fn to_padded_string(&self) -> String {
        format!("{:019}", self.id)
    }
}

impl From<SonyflakeId> for u64 {
    fn from(id: SonyflakeId) -> Self {
        id.to_raw()
    }
}

impl From<SonyflakeId> for i64 {
    fn from(id: SonyflakeId) -> Self {
        // The reserved bit is clear for every generated ID.
        id.to_raw() as i64
    }
}

impl TryFrom<u64> for SonyflakeId {
    type Error = Error;

    fn try_from(raw: u64) -> Result<Self> {
        let id = Self::from_raw(raw);
        if id.is_valid() {
            Ok(id)
        } else {
            Err(Error::InvalidId { raw: raw.into() })
        }
    }
}

impl TryFrom<i64> for SonyflakeId {
    type Error = Error;

    fn try_from(raw: i64) -> Result<Self> {
        u64::try_from(raw)
            .map(Self::from_raw)
            .map_err(|_| Error::InvalidId { raw: raw.into() })
    }
}

impl fmt::Display for SonyflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SonyflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SonyflakeId")
            .field("raw", &format_args!("0x{:016x} ({})", self.id, self.id))
            .field("elapsed_ticks", &self.elapsed_ticks())
            .field("sequence", &self.sequence())
            .field("machine_id", &self.machine_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_and_bounds() {
        let ticks = SonyflakeId::max_elapsed_ticks();
        let mid = SonyflakeId::max_machine_id();
        let seq = SonyflakeId::max_sequence();

        let id = SonyflakeId::from(ticks, mid, seq);
        println!("ID: {id:?}");
        assert_eq!(id.elapsed_ticks(), ticks);
        assert_eq!(id.machine_id(), mid);
        assert_eq!(id.sequence(), seq);
        assert_eq!(id.to_raw(), i64::MAX as u64);
        assert!(id.is_valid());
        assert_eq!(SonyflakeId::from_components(ticks, mid, seq), id);
    }

    #[test]
    fn layout_matches_shift_and_mask() {
        let id = SonyflakeId::from(0x12_3456_789A, 0xBEEF, 0x42);
        let raw = id.to_raw();
        assert_eq!(raw >> 24, 0x12_3456_789A);
        assert_eq!((raw >> 16) & 0xFF, 0x42);
        assert_eq!(raw & 0xFFFF, 0xBEEF);
    }

    #[test]
    fn max_elapsed_ticks_is_about_174_years() {
        assert_eq!(SonyflakeId::max_elapsed_ticks(), 549_755_813_887);
        let years = SonyflakeId::from(SonyflakeId::max_elapsed_ticks(), 0, 0)
            .elapsed_time()
            .as_secs()
            / (365 * 24 * 60 * 60);
        assert_eq!(years, 174);
    }

    #[test]
    fn ordering_follows_ticks_then_sequence() {
        let a = SonyflakeId::from(10, 65_535, 255);
        let b = SonyflakeId::from(11, 0, 0);
        let c = SonyflakeId::from(11, 0, 1);
        assert!(a < b && b < c);
    }

    #[test]
    fn increment_and_rollover() {
        let id = SonyflakeId::from(5, 9, 0);
        let next = id.increment_sequence();
        assert_eq!(next.sequence(), 1);
        assert_eq!(next.elapsed_ticks(), 5);
        assert_eq!(next.machine_id(), 9);

        let rolled = next.rollover_to_tick(6);
        assert_eq!(rolled.sequence(), 0);
        assert_eq!(rolled.elapsed_ticks(), 6);
        assert_eq!(rolled.machine_id(), 9);

        assert!(!SonyflakeId::from(5, 9, 255).has_sequence_room());
    }

    #[test]
    fn timestamp_adds_ticks_to_start_time() {
        let start = Duration::from_secs(1_621_209_600); // 2021-05-17T00:00:00Z
        let id = SonyflakeId::from(150, 1, 0);
        assert_eq!(id.elapsed_time(), Duration::from_millis(1500));
        assert_eq!(
            id.timestamp(start),
            UNIX_EPOCH + start + Duration::from_millis(1500)
        );
    }

    #[test]
    fn decompose_reports_every_field() {
        let id = SonyflakeId::from(77, 513, 4);
        let parts = id.decompose();
        assert_eq!(parts.id, id.to_raw());
        assert_eq!(parts.msb, 0);
        assert_eq!(parts.elapsed_ticks, 77);
        assert_eq!(parts.sequence, 4);
        assert_eq!(parts.machine_id, 513);
    }

    #[test]
    fn conversions_reject_reserved_bit() {
        assert!(SonyflakeId::try_from(u64::MAX).is_err());
        assert!(SonyflakeId::try_from(-1_i64).is_err());

        let id = SonyflakeId::try_from(123_456_789_u64).unwrap();
        assert_eq!(u64::from(id), 123_456_789);
        assert_eq!(i64::from(id), 123_456_789);
        assert_eq!(SonyflakeId::try_from(42_i64).unwrap().to_raw(), 42);
    }

    #[test]
    fn padded_string_sorts_like_numbers() {
        let small = SonyflakeId::from_raw(42);
        let large = SonyflakeId::from(SonyflakeId::max_elapsed_ticks(), 0, 0);
        assert_eq!(small.to_padded_string(), "0000000000000000042");
        assert_eq!(large.to_padded_string().len(), 19);
        assert!(small.to_padded_string() < large.to_padded_string());
        assert_eq!(small.to_string(), "42");
    }

    #[test]
    #[should_panic(expected = "elapsed ticks overflow")]
    fn elapsed_ticks_overflow_panics() {
        let ticks = SonyflakeId::max_elapsed_ticks() + 1;
        SonyflakeId::from_components(ticks, 0, 0);
    }

    #[test]
    #[should_panic(expected = "sequence overflow")]
    fn sequence_overflow_panics() {
        SonyflakeId::from(0, 0, u8::MAX).increment_sequence();
    }

    #[test]
    fn checked_timestamp_reports_overflow() {
        let id = SonyflakeId::from(250, 0, 0);
        let start = Duration::from_secs(1_000);
        assert_eq!(id.checked_timestamp(start), Some(id.timestamp(start)));
        assert_eq!(
            id.checked_timestamp(start),
            Some(UNIX_EPOCH + Duration::from_millis(1_002_500))
        );
        assert_eq!(id.checked_timestamp(Duration::MAX), None);
    }

    #[test]
    #[should_panic]
    fn timestamp_overflow_panics() {
        SonyflakeId::from(1, 0, 0).timestamp(Duration::MAX);
    }
}
