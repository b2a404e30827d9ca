/// The fields of a [`SonyflakeId`], as returned by
/// [`SonyflakeId::decompose`].
///
/// [`SonyflakeId`]: crate::SonyflakeId
/// [`SonyflakeId::decompose`]: crate::SonyflakeId::decompose
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Parts {
    /// The raw ID.
    pub id: u64,
    /// The reserved most significant bit. Always `0` for generated IDs.
    pub msb: u64,
    /// 10 ms ticks since the start time.
    pub elapsed_ticks: u64,
    /// Sequence number within the tick.
    pub sequence: u8,
    /// Machine ID of the generator.
    pub machine_id: u16,
}
