use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::SonyflakeId;

impl Serialize for SonyflakeId {
    /// Serializes the ID as its native `u64` representation.
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_u64(self.to_raw())
    }
}

impl<'de> Deserialize<'de> for SonyflakeId {
    /// Deserializes the ID from its native `u64` representation, rejecting
    /// values with the reserved bit set.
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = u64::deserialize(d)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// Serialize a Sonyflake ID as a zero-padded 19 digit decimal string, for
/// consumers that cannot represent 63-bit integers exactly (e.g. JSON parsed
/// into IEEE doubles).
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use sonyflake::SonyflakeId;
///
/// #[derive(Serialize, Deserialize)]
/// struct Event {
///     #[serde(with = "sonyflake::as_padded_string")]
///     id: SonyflakeId,
/// }
///
/// let event = Event { id: SonyflakeId::from(1, 2, 3) };
/// let json = serde_json::to_string(&event).unwrap();
/// assert_eq!(json, r#"{"id":"0000000000016973826"}"#);
/// ```
pub mod as_padded_string {
    use super::{Deserializer, Serializer};
    use crate::SonyflakeId;

    /// Serialize a Sonyflake ID as a zero-padded decimal string.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying serializer fails.
    pub fn serialize<S>(id: &SonyflakeId, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.serialize_str(&id.to_padded_string())
    }

    /// Deserialize a Sonyflake ID from a decimal string, padded or not.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The underlying deserializer fails
    /// - The string is not a decimal `u64`
    /// - The value has the reserved bit set
    pub fn deserialize<'de, D>(d: D) -> Result<SonyflakeId, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DecimalVisitor;

        impl serde::de::Visitor<'_> for DecimalVisitor {
            type Value = SonyflakeId;

            fn expecting(&self, formatter: &mut core::fmt::Formatter) -> core::fmt::Result {
                formatter.write_str("a decimal encoded sonyflake id")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let raw: u64 = v.parse().map_err(E::custom)?;
                SonyflakeId::try_from(raw).map_err(E::custom)
            }
        }

        d.deserialize_str(DecimalVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Parts;

    #[derive(PartialEq, Eq, Debug, Serialize, Deserialize)]
    struct Row {
        event_id: SonyflakeId,
    }

    #[derive(PartialEq, Eq, Debug, Serialize, Deserialize)]
    struct PaddedRow {
        #[serde(with = "as_padded_string")]
        event_id: SonyflakeId,
    }

    #[test]
    fn native_roundtrip() {
        let row = Row {
            event_id: SonyflakeId::from(100, 7, 2),
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, format!(r#"{{"event_id":{}}}"#, row.event_id.to_raw()));

        let back: Row = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn native_rejects_reserved_bit() {
        let json = format!(r#"{{"event_id":{}}}"#, u64::MAX);
        let err = serde_json::from_str::<Row>(&json).unwrap_err();
        assert!(err.to_string().contains("invalid sonyflake id"), "{err}");
    }

    #[test]
    fn padded_string_roundtrip() {
        let row = PaddedRow {
            event_id: SonyflakeId::from(1, 2, 3),
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"event_id":"0000000000016973826"}"#);

        let back: PaddedRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);

        let unpadded: PaddedRow = serde_json::from_str(r#"{"event_id":"16973826"}"#).unwrap();
        assert_eq!(unpadded, row);
    }

    #[test]
    fn padded_string_rejects_garbage() {
        assert!(serde_json::from_str::<PaddedRow>(r#"{"event_id":"12ab"}"#).is_err());
        assert!(serde_json::from_str::<PaddedRow>(r#"{"event_id":"-1"}"#).is_err());
    }

    #[test]
    fn parts_serialize_by_field() {
        let parts = SonyflakeId::from(1, 2, 3).decompose();
        let value = serde_json::to_value(parts).unwrap();
        assert_eq!(value["elapsed_ticks"], 1);
        assert_eq!(value["sequence"], 3);
        assert_eq!(value["machine_id"], 2);

        let back: Parts = serde_json::from_value(value).unwrap();
        assert_eq!(back, parts);
    }
}
