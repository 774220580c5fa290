//! Order-preserving encoding of composite keys.
//!
//! Every field is written as a one-byte tag followed by a type-specific
//! payload chosen so that comparing encoded keys byte-for-byte gives the
//! declared field order:
//!
//! - text and byte fields use escaped-terminator framing (`0x00` escaped
//!   as `0x00 0xFF`, terminated by `0x00 0x00`), which keeps lexicographic
//!   order, round-trips embedded zero bytes, and leaves a shorter string
//!   ordered before its extensions;
//! - 64-bit integers flip the sign bit and emit big-endian;
//! - arbitrary-precision integers emit a biased header byte (`0x80` plus
//!   the signed magnitude length) followed by the magnitude;
//! - plain UUIDs emit their 16 bytes as-is; time-ordered UUIDs emit the
//!   timestamp-major permutation so chronology dominates;
//! - descending fields bit-invert the payload (with the escape scheme
//!   mirrored), reversing the comparison.
//!
//! A key is the concatenation of its encoded fields, so any encoded key is
//! a strict byte-prefix of every longer key sharing its leading fields.

use num_bigint::{BigInt, BigUint, Sign};
use thiserror::Error;
use uuid::Uuid;

use crate::time_uuid::TimeUuid;
use crate::value::{Direction, Tag, TypedValue};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Decoding error: {0}")]
    Decoding(String),
}

/// Largest magnitude, in bytes, the biased integer header can express.
const MAX_MAGNITUDE_BYTES: usize = 126;

/// An ordered sequence of typed, independently directed key fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositeKey {
    fields: Vec<(TypedValue, Direction)>,
}

impl CompositeKey {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field sorted ascending.
    pub fn ascending(mut self, value: impl Into<TypedValue>) -> Self {
        self.fields.push((value.into(), Direction::Ascending));
        self
    }

    /// Append a field sorted descending.
    pub fn descending(mut self, value: impl Into<TypedValue>) -> Self {
        self.fields.push((value.into(), Direction::Descending));
        self
    }

    pub fn push(&mut self, value: TypedValue, direction: Direction) {
        self.fields.push((value, direction));
    }

    pub fn fields(&self) -> &[(TypedValue, Direction)] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_key(&self.fields)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(Self {
            fields: decode_key(bytes)?,
        })
    }
}

/// Encode a field sequence into one comparable byte string.
pub fn encode_key(fields: &[(TypedValue, Direction)]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for (value, direction) in fields {
        encode_field(value, *direction, &mut out)?;
    }
    Ok(out)
}

/// Encode a single tagged field onto the end of `out`.
pub fn encode_field(value: &TypedValue, direction: Direction, out: &mut Vec<u8>) -> Result<()> {
    out.push(value.tag().byte(direction));
    match value {
        TypedValue::Ascii(text) => {
            if !text.is_ascii() {
                return Err(Error::Encoding(format!(
                    "non-ascii content in ascii field: {text:?}"
                )));
            }
            put_terminated(text.as_bytes(), direction, out);
        }
        TypedValue::Utf8(text) => put_terminated(text.as_bytes(), direction, out),
        TypedValue::Bytes(bytes) => put_terminated(bytes, direction, out),
        TypedValue::Int64(n) => {
            let mut be = ((*n as u64) ^ (1 << 63)).to_be_bytes();
            if direction.is_descending() {
                invert(&mut be);
            }
            out.extend_from_slice(&be);
        }
        TypedValue::BigInt(n) => put_bigint(n, direction, out)?,
        TypedValue::Uuid(uuid) => {
            let mut bytes = *uuid.as_bytes();
            if direction.is_descending() {
                invert(&mut bytes);
            }
            out.extend_from_slice(&bytes);
        }
        TypedValue::TimeUuid(uuid) => {
            let mut bytes = uuid.ordered_bytes();
            if direction.is_descending() {
                invert(&mut bytes);
            }
            out.extend_from_slice(&bytes);
        }
    }
    Ok(())
}

/// Decode every field of an encoded key.
pub fn decode_key(bytes: &[u8]) -> Result<Vec<(TypedValue, Direction)>> {
    let mut cursor = 0;
    let mut fields = Vec::new();
    while cursor < bytes.len() {
        fields.push(decode_field(bytes, &mut cursor)?);
    }
    Ok(fields)
}

/// Decode a key whose tag sequence is known, verifying each tag and
/// direction and rejecting trailing bytes.
pub fn decode_key_expecting(
    bytes: &[u8],
    expected: &[(Tag, Direction)],
) -> Result<Vec<TypedValue>> {
    let mut cursor = 0;
    let mut values = Vec::with_capacity(expected.len());
    for &(tag, direction) in expected {
        let (value, found) = decode_field(bytes, &mut cursor)?;
        if value.tag() != tag || found != direction {
            return Err(Error::Decoding(format!(
                "expected {:?} {:?} field, found {:?} {:?}",
                direction,
                tag,
                found,
                value.tag()
            )));
        }
        values.push(value);
    }
    if cursor != bytes.len() {
        return Err(Error::Decoding(format!(
            "{} trailing bytes after {} expected fields",
            bytes.len() - cursor,
            expected.len()
        )));
    }
    Ok(values)
}

fn decode_field(bytes: &[u8], cursor: &mut usize) -> Result<(TypedValue, Direction)> {
    let tag_byte = next_byte(bytes, cursor)?;
    let (tag, direction) = Tag::from_byte(tag_byte)
        .ok_or_else(|| Error::Decoding(format!("unknown tag byte 0x{tag_byte:02X}")))?;
    let value = match tag {
        Tag::Ascii => {
            let raw = take_terminated(bytes, cursor, direction)?;
            if !raw.is_ascii() {
                return Err(Error::Decoding(
                    "non-ascii content in ascii field".to_string(),
                ));
            }
            let text = String::from_utf8(raw)
                .map_err(|e| Error::Decoding(format!("invalid ascii field: {e}")))?;
            TypedValue::Ascii(text)
        }
        Tag::Utf8 => {
            let raw = take_terminated(bytes, cursor, direction)?;
            let text = String::from_utf8(raw)
                .map_err(|e| Error::Decoding(format!("invalid utf8 field: {e}")))?;
            TypedValue::Utf8(text)
        }
        Tag::Bytes => TypedValue::Bytes(take_terminated(bytes, cursor, direction)?),
        Tag::Int64 => {
            let mut be = take_array::<8>(bytes, cursor)?;
            if direction.is_descending() {
                invert(&mut be);
            }
            TypedValue::Int64((u64::from_be_bytes(be) ^ (1 << 63)) as i64)
        }
        Tag::BigInt => take_bigint(bytes, cursor, direction)?,
        Tag::Uuid => {
            let mut raw = take_array::<16>(bytes, cursor)?;
            if direction.is_descending() {
                invert(&mut raw);
            }
            TypedValue::Uuid(Uuid::from_bytes(raw))
        }
        Tag::TimeUuid => {
            let mut raw = take_array::<16>(bytes, cursor)?;
            if direction.is_descending() {
                invert(&mut raw);
            }
            TypedValue::TimeUuid(TimeUuid::from_ordered_bytes(raw)?)
        }
    };
    Ok((value, direction))
}

/// Write escaped-terminator framed content. Ascending: content verbatim,
/// `0x00` escaped as `0x00 0xFF`, terminator `0x00 0x00`. Descending:
/// content inverted, `0xFF` escaped as `0xFF 0x00`, terminator `0xFF 0xFF`
/// (which orders a prefix after its extensions, as reversal requires).
fn put_terminated(content: &[u8], direction: Direction, out: &mut Vec<u8>) {
    match direction {
        Direction::Ascending => {
            for &b in content {
                if b == 0x00 {
                    out.extend_from_slice(&[0x00, 0xFF]);
                } else {
                    out.push(b);
                }
            }
            out.extend_from_slice(&[0x00, 0x00]);
        }
        Direction::Descending => {
            for &b in content {
                if b == 0x00 {
                    out.extend_from_slice(&[0xFF, 0x00]);
                } else {
                    out.push(!b);
                }
            }
            out.extend_from_slice(&[0xFF, 0xFF]);
        }
    }
}

fn take_terminated(bytes: &[u8], cursor: &mut usize, direction: Direction) -> Result<Vec<u8>> {
    let mut content = Vec::new();
    match direction {
        Direction::Ascending => loop {
            match next_byte(bytes, cursor)? {
                0x00 => match next_byte(bytes, cursor)? {
                    0x00 => return Ok(content),
                    0xFF => content.push(0x00),
                    other => {
                        return Err(Error::Decoding(format!(
                            "invalid escape byte 0x{other:02X} in framed field"
                        )));
                    }
                },
                b => content.push(b),
            }
        },
        Direction::Descending => loop {
            match next_byte(bytes, cursor)? {
                0xFF => match next_byte(bytes, cursor)? {
                    0xFF => return Ok(content),
                    0x00 => content.push(0x00),
                    other => {
                        return Err(Error::Decoding(format!(
                            "invalid escape byte 0x{other:02X} in framed field"
                        )));
                    }
                },
                b => content.push(!b),
            }
        },
    }
}

/// Biased sign-and-magnitude encoding. Zero is the bare header `0x80`; a
/// positive value with an n-byte magnitude writes `0x80 + n` then the
/// magnitude big-endian; a negative value writes `0x80 - n` then the
/// bitwise NOT of the magnitude. Larger numbers therefore get larger
/// headers, and within one header length the magnitude bytes decide.
fn put_bigint(n: &BigInt, direction: Direction, out: &mut Vec<u8>) -> Result<()> {
    let start = out.len();
    match n.sign() {
        Sign::NoSign => out.push(0x80),
        Sign::Plus => {
            let magnitude = n.magnitude().to_bytes_be();
            if magnitude.len() > MAX_MAGNITUDE_BYTES {
                return Err(Error::Encoding(format!(
                    "integer magnitude of {} bytes exceeds the maximum of {}",
                    magnitude.len(),
                    MAX_MAGNITUDE_BYTES
                )));
            }
            out.push(0x80 + magnitude.len() as u8);
            out.extend_from_slice(&magnitude);
        }
        Sign::Minus => {
            let magnitude = n.magnitude().to_bytes_be();
            if magnitude.len() > MAX_MAGNITUDE_BYTES {
                return Err(Error::Encoding(format!(
                    "integer magnitude of {} bytes exceeds the maximum of {}",
                    magnitude.len(),
                    MAX_MAGNITUDE_BYTES
                )));
            }
            out.push(0x80 - magnitude.len() as u8);
            out.extend(magnitude.iter().map(|b| !b));
        }
    }
    if direction.is_descending() {
        invert(&mut out[start..]);
    }
    Ok(())
}

fn take_bigint(bytes: &[u8], cursor: &mut usize, direction: Direction) -> Result<TypedValue> {
    let mut header = next_byte(bytes, cursor)?;
    if direction.is_descending() {
        header = !header;
    }
    if header == 0x80 {
        return Ok(TypedValue::BigInt(BigInt::from(0)));
    }

    let (sign, len) = if header > 0x80 {
        (Sign::Plus, (header - 0x80) as usize)
    } else {
        (Sign::Minus, (0x80 - header) as usize)
    };
    if len > MAX_MAGNITUDE_BYTES {
        return Err(Error::Decoding(format!(
            "invalid integer header 0x{header:02X}"
        )));
    }

    let mut magnitude = take_slice(bytes, cursor, len)?.to_vec();
    if direction.is_descending() {
        invert(&mut magnitude);
    }
    if sign == Sign::Minus {
        invert(&mut magnitude);
    }
    if magnitude[0] == 0x00 {
        return Err(Error::Decoding(
            "non-minimal integer magnitude".to_string(),
        ));
    }
    Ok(TypedValue::BigInt(BigInt::from_biguint(
        sign,
        BigUint::from_bytes_be(&magnitude),
    )))
}

fn next_byte(bytes: &[u8], cursor: &mut usize) -> Result<u8> {
    let b = *bytes
        .get(*cursor)
        .ok_or_else(|| Error::Decoding("truncated key".to_string()))?;
    *cursor += 1;
    Ok(b)
}

fn take_slice<'a>(bytes: &'a [u8], cursor: &mut usize, len: usize) -> Result<&'a [u8]> {
    let end = cursor
        .checked_add(len)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| {
            Error::Decoding(format!(
                "truncated key: expected {len} more bytes, found {}",
                bytes.len() - *cursor
            ))
        })?;
    let slice = &bytes[*cursor..end];
    *cursor = end;
    Ok(slice)
}

fn take_array<const N: usize>(bytes: &[u8], cursor: &mut usize) -> Result<[u8; N]> {
    let mut out = [0u8; N];
    out.copy_from_slice(take_slice(bytes, cursor, N)?);
    Ok(out)
}

fn invert(bytes: &mut [u8]) {
    for b in bytes {
        *b = !*b;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_one(value: TypedValue, direction: Direction) -> Vec<u8> {
        encode_key(&[(value, direction)]).unwrap()
    }

    fn assert_round_trip(value: TypedValue, direction: Direction) {
        let encoded = encode_one(value.clone(), direction);
        let decoded = decode_key(&encoded).unwrap();
        assert_eq!(decoded, vec![(value, direction)]);
    }

    // ==================== Round trips ====================

    #[test]
    fn test_round_trip_all_types() {
        let values = [
            TypedValue::Ascii("users".to_string()),
            TypedValue::Ascii(String::new()),
            TypedValue::Bytes(vec![0x00, 0xFF, 0x00, 0x7F]),
            TypedValue::Bytes(Vec::new()),
            TypedValue::BigInt(BigInt::from(0)),
            TypedValue::BigInt(BigInt::from(987_654_321_012_345_678_i64)),
            TypedValue::BigInt(BigInt::from(-987_654_321_012_345_678_i64)),
            TypedValue::BigInt(BigInt::from(1) << 200u32),
            TypedValue::BigInt(-(BigInt::from(1) << 200u32)),
            TypedValue::Int64(0),
            TypedValue::Int64(i64::MIN),
            TypedValue::Int64(i64::MAX),
            TypedValue::Int64(-42),
            TypedValue::Utf8("héllo wörld".to_string()),
            TypedValue::Utf8("with\0nul".to_string()),
            TypedValue::Uuid(Uuid::new_v4()),
            TypedValue::Uuid(Uuid::nil()),
            TypedValue::TimeUuid(TimeUuid::now()),
        ];
        for value in values {
            assert_round_trip(value.clone(), Direction::Ascending);
            assert_round_trip(value, Direction::Descending);
        }
    }

    #[test]
    fn test_round_trip_multi_field_key() {
        let fields = vec![
            (
                TypedValue::Ascii("queue".to_string()),
                Direction::Ascending,
            ),
            (TypedValue::Int64(-7), Direction::Descending),
            (TypedValue::Uuid(Uuid::new_v4()), Direction::Ascending),
        ];
        let encoded = encode_key(&fields).unwrap();
        assert_eq!(decode_key(&encoded).unwrap(), fields);
    }

    // ==================== Ordering ====================

    fn assert_ordered(lesser: TypedValue, greater: TypedValue) {
        let a = encode_one(lesser.clone(), Direction::Ascending);
        let b = encode_one(greater.clone(), Direction::Ascending);
        assert!(a < b, "{lesser:?} should encode below {greater:?}");

        let a = encode_one(lesser.clone(), Direction::Descending);
        let b = encode_one(greater.clone(), Direction::Descending);
        assert!(a > b, "{lesser:?} should encode above {greater:?} reversed");
    }

    #[test]
    fn test_int64_order() {
        let cases = [
            (i64::MIN, i64::MIN + 1),
            (-1_000_000, -1),
            (-1, 0),
            (0, 1),
            (1, 256),
            (i64::MAX - 1, i64::MAX),
        ];
        for (lo, hi) in cases {
            assert_ordered(TypedValue::Int64(lo), TypedValue::Int64(hi));
        }
    }

    #[test]
    fn test_bigint_order() {
        let cases = [
            (BigInt::from(-257), BigInt::from(-256)),
            (BigInt::from(-256), BigInt::from(-255)),
            (BigInt::from(-255), BigInt::from(-1)),
            (BigInt::from(-1), BigInt::from(0)),
            (BigInt::from(0), BigInt::from(1)),
            (BigInt::from(255), BigInt::from(256)),
            (BigInt::from(1) << 64u32, BigInt::from(1) << 72u32),
            (-(BigInt::from(1) << 72u32), -(BigInt::from(1) << 64u32)),
        ];
        for (lo, hi) in cases {
            assert_ordered(TypedValue::BigInt(lo), TypedValue::BigInt(hi));
        }
    }

    #[test]
    fn test_text_order() {
        let cases = [("", "a"), ("a", "ab"), ("ab", "b"), ("abc", "abd")];
        for (lo, hi) in cases {
            assert_ordered(
                TypedValue::Utf8(lo.to_string()),
                TypedValue::Utf8(hi.to_string()),
            );
        }
        // Embedded zero bytes still order below any non-zero content.
        assert_ordered(
            TypedValue::Bytes(vec![b'a', 0x00, b'z']),
            TypedValue::Bytes(vec![b'a', 0x01]),
        );
        assert_ordered(
            TypedValue::Bytes(vec![b'a']),
            TypedValue::Bytes(vec![b'a', 0x00]),
        );
    }

    #[test]
    fn test_time_uuid_order() {
        let node = [0x01, 0, 0, 0, 0, 0];
        let early = TimeUuid::from_timestamp(5_000_000, 0x1234, &[0xFF; 6]);
        let late = TimeUuid::from_timestamp(6_000_000, 0, &node);
        assert_ordered(TypedValue::TimeUuid(early), TypedValue::TimeUuid(late));
    }

    // ==================== Prefix property ====================

    #[test]
    fn test_longer_key_extends_shorter() {
        let prefix = encode_key(&[(
            TypedValue::Ascii("users".to_string()),
            Direction::Ascending,
        )])
        .unwrap();
        let full = encode_key(&[
            (
                TypedValue::Ascii("users".to_string()),
                Direction::Ascending,
            ),
            (TypedValue::Int64(12), Direction::Descending),
            (
                TypedValue::Utf8("anything".to_string()),
                Direction::Ascending,
            ),
        ])
        .unwrap();
        assert!(full.starts_with(&prefix));
    }

    // ==================== Expected-tag decode ====================

    #[test]
    fn test_decode_expecting() {
        let encoded = encode_key(&[
            (TypedValue::Ascii("inbox".to_string()), Direction::Ascending),
            (TypedValue::Int64(3), Direction::Descending),
        ])
        .unwrap();

        let values = decode_key_expecting(
            &encoded,
            &[
                (Tag::Ascii, Direction::Ascending),
                (Tag::Int64, Direction::Descending),
            ],
        )
        .unwrap();
        assert_eq!(values[0], TypedValue::Ascii("inbox".to_string()));
        assert_eq!(values[1], TypedValue::Int64(3));

        match decode_key_expecting(&encoded, &[(Tag::Utf8, Direction::Ascending)]) {
            Err(Error::Decoding(_)) => {}
            other => panic!("Expected decoding error, got {:?}", other),
        }

        // Trailing fields beyond the expected schema are rejected.
        match decode_key_expecting(&encoded, &[(Tag::Ascii, Direction::Ascending)]) {
            Err(Error::Decoding(_)) => {}
            other => panic!("Expected decoding error, got {:?}", other),
        }
    }

    // ==================== Errors ====================

    #[test]
    fn test_encode_rejects_non_ascii() {
        let mut out = Vec::new();
        match encode_field(
            &TypedValue::Ascii("héllo".to_string()),
            Direction::Ascending,
            &mut out,
        ) {
            Err(Error::Encoding(_)) => {}
            other => panic!("Expected encoding error, got {:?}", other),
        }
    }

    #[test]
    fn test_encode_rejects_oversized_bigint() {
        // 2^1008 has a 127-byte magnitude, one past the header's reach.
        let huge = BigInt::from(1) << (8 * MAX_MAGNITUDE_BYTES);
        let mut out = Vec::new();
        match encode_field(&TypedValue::BigInt(huge), Direction::Ascending, &mut out) {
            Err(Error::Encoding(_)) => {}
            other => panic!("Expected encoding error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_unknown_tag() {
        match decode_key(&[b'z', 1, 2, 3]) {
            Err(Error::Decoding(_)) => {}
            other => panic!("Expected decoding error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_truncated() {
        let encoded = encode_one(TypedValue::Int64(99), Direction::Ascending);
        match decode_key(&encoded[..encoded.len() - 1]) {
            Err(Error::Decoding(_)) => {}
            other => panic!("Expected decoding error, got {:?}", other),
        }

        let encoded = encode_one(TypedValue::Utf8("abc".to_string()), Direction::Ascending);
        match decode_key(&encoded[..encoded.len() - 1]) {
            Err(Error::Decoding(_)) => {}
            other => panic!("Expected decoding error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_dangling_escape() {
        // Tag, one content byte, then an escape introducer followed by an
        // invalid second byte.
        match decode_key(&[b's', b'x', 0x00, 0x42]) {
            Err(Error::Decoding(_)) => {}
            other => panic!("Expected decoding error, got {:?}", other),
        }
    }

    // ==================== Composite key builder ====================

    #[test]
    fn test_composite_key_builder_round_trip() {
        let key = CompositeKey::new()
            .ascending(TypedValue::Ascii("users".to_string()))
            .ascending(TimeUuid::now())
            .descending(TypedValue::Utf8("bob".to_string()));
        assert_eq!(key.len(), 3);

        let encoded = key.encode().unwrap();
        let decoded = CompositeKey::decode(&encoded).unwrap();
        assert_eq!(decoded, key);
    }

    #[test]
    fn test_scan_key_scenario() {
        // A property-index style key: collection name ascending, version
        // time ascending, value descending. Replacing the version with a
        // later one must strictly increase the whole encoded key.
        let node = [0x01, 0, 0, 0, 0, 0];
        let t1 = TimeUuid::from_timestamp(10_000_000, 0, &node);
        let t2 = TimeUuid::from_timestamp(10_000_001, 0, &node);

        let build = |t: TimeUuid| {
            CompositeKey::new()
                .ascending(TypedValue::Ascii("users".to_string()))
                .ascending(t)
                .descending(TypedValue::Utf8("bob".to_string()))
        };

        let key = build(t1);
        let encoded = key.encode().unwrap();
        let decoded = CompositeKey::decode(&encoded).unwrap();
        assert_eq!(decoded.fields(), key.fields());

        let later = build(t2).encode().unwrap();
        assert!(later > encoded);
    }
}
