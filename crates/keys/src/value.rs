//! Typed key field values and their one-byte wire tags.

use num_bigint::BigInt;
use uuid::Uuid;

use crate::time_uuid::TimeUuid;

/// Sort direction for a single key field.
///
/// Descending fields are bit-inverted on the wire so that raw byte
/// comparison yields the reversed order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    pub fn is_descending(self) -> bool {
        self == Direction::Descending
    }
}

/// Field type tag. Combined with a [`Direction`], each tag maps to a
/// one-byte wire marker: a lowercase ASCII letter for ascending fields,
/// the uppercase letter for descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// 7-bit ASCII text (`a`/`A`).
    Ascii,
    /// Opaque byte string (`b`/`B`).
    Bytes,
    /// Arbitrary-precision signed integer (`i`/`I`).
    BigInt,
    /// 64-bit signed integer (`l`/`L`).
    Int64,
    /// UTF-8 text (`s`/`S`).
    Utf8,
    /// Time-ordered (version 1) UUID (`t`/`T`).
    TimeUuid,
    /// Plain UUID, compared by raw bytes (`u`/`U`).
    Uuid,
}

impl Tag {
    /// Every supported tag, in wire-letter order.
    pub const ALL: [Tag; 7] = [
        Tag::Ascii,
        Tag::Bytes,
        Tag::BigInt,
        Tag::Int64,
        Tag::Utf8,
        Tag::TimeUuid,
        Tag::Uuid,
    ];

    /// The one-byte wire marker for this tag in the given direction.
    pub fn byte(self, direction: Direction) -> u8 {
        let lower = match self {
            Tag::Ascii => b'a',
            Tag::Bytes => b'b',
            Tag::BigInt => b'i',
            Tag::Int64 => b'l',
            Tag::Utf8 => b's',
            Tag::TimeUuid => b't',
            Tag::Uuid => b'u',
        };
        match direction {
            Direction::Ascending => lower,
            Direction::Descending => lower.to_ascii_uppercase(),
        }
    }

    /// Parse a wire marker back into its tag and direction.
    pub fn from_byte(byte: u8) -> Option<(Tag, Direction)> {
        let direction = if byte.is_ascii_uppercase() {
            Direction::Descending
        } else {
            Direction::Ascending
        };
        let tag = match byte.to_ascii_lowercase() {
            b'a' => Tag::Ascii,
            b'b' => Tag::Bytes,
            b'i' => Tag::BigInt,
            b'l' => Tag::Int64,
            b's' => Tag::Utf8,
            b't' => Tag::TimeUuid,
            b'u' => Tag::Uuid,
            _ => return None,
        };
        Some((tag, direction))
    }
}

/// A single typed key field value.
///
/// Values carry no direction themselves; direction is chosen per field at
/// encode time and travels in the wire tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypedValue {
    Ascii(String),
    Bytes(Vec<u8>),
    BigInt(BigInt),
    Int64(i64),
    Utf8(String),
    TimeUuid(TimeUuid),
    Uuid(Uuid),
}

impl TypedValue {
    pub fn tag(&self) -> Tag {
        match self {
            TypedValue::Ascii(_) => Tag::Ascii,
            TypedValue::Bytes(_) => Tag::Bytes,
            TypedValue::BigInt(_) => Tag::BigInt,
            TypedValue::Int64(_) => Tag::Int64,
            TypedValue::Utf8(_) => Tag::Utf8,
            TypedValue::TimeUuid(_) => Tag::TimeUuid,
            TypedValue::Uuid(_) => Tag::Uuid,
        }
    }
}

impl From<i64> for TypedValue {
    fn from(value: i64) -> Self {
        TypedValue::Int64(value)
    }
}

impl From<BigInt> for TypedValue {
    fn from(value: BigInt) -> Self {
        TypedValue::BigInt(value)
    }
}

impl From<Uuid> for TypedValue {
    fn from(value: Uuid) -> Self {
        TypedValue::Uuid(value)
    }
}

impl From<TimeUuid> for TypedValue {
    fn from(value: TimeUuid) -> Self {
        TypedValue::TimeUuid(value)
    }
}

impl From<Vec<u8>> for TypedValue {
    fn from(value: Vec<u8>) -> Self {
        TypedValue::Bytes(value)
    }
}

// Plain strings default to UTF-8; ascii fields are opted into explicitly.
impl From<String> for TypedValue {
    fn from(value: String) -> Self {
        TypedValue::Utf8(value)
    }
}

impl From<&str> for TypedValue {
    fn from(value: &str) -> Self {
        TypedValue::Utf8(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_bytes_round_trip() {
        for tag in Tag::ALL {
            for direction in [Direction::Ascending, Direction::Descending] {
                let byte = tag.byte(direction);
                assert_eq!(Tag::from_byte(byte), Some((tag, direction)));
            }
        }
    }

    #[test]
    fn test_ascending_tags_are_lowercase() {
        for tag in Tag::ALL {
            assert!(tag.byte(Direction::Ascending).is_ascii_lowercase());
            assert!(tag.byte(Direction::Descending).is_ascii_uppercase());
        }
    }

    #[test]
    fn test_unknown_tag_byte() {
        assert_eq!(Tag::from_byte(b'z'), None);
        assert_eq!(Tag::from_byte(0x00), None);
        assert_eq!(Tag::from_byte(0xFF), None);
    }
}
