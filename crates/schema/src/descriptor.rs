//! Column-family descriptors and their key-ordering schemes.

use std::cmp::Ordering;

use quarry_keys::{Direction, Tag, timestamp_major};

/// How a table orders its column keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScheme {
    /// Opaque byte keys, plain lexicographic order.
    Bytes,
    /// Every key is the raw form of a single fixed type.
    Single(Tag),
    /// Keys are self-describing composite encodings from the key codec.
    Composite,
}

impl KeyScheme {
    /// Compare two raw column keys under this scheme.
    ///
    /// Composite encodings are order-preserving by construction, so they
    /// compare as plain bytes, as do the raw single-type forms whose byte
    /// order already matches value order (text, bytes, plain UUIDs). The
    /// two exceptions are handled here: raw time-UUIDs compare in
    /// timestamp-major permuted form, and raw 64-bit integers compare
    /// signed.
    pub fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        match self {
            KeyScheme::Bytes | KeyScheme::Composite => a.cmp(b),
            KeyScheme::Single(Tag::TimeUuid) => match (to_array::<16>(a), to_array::<16>(b)) {
                (Some(ua), Some(ub)) => timestamp_major(ua).cmp(&timestamp_major(ub)),
                _ => a.cmp(b),
            },
            KeyScheme::Single(Tag::Int64) => match (to_array::<8>(a), to_array::<8>(b)) {
                (Some(ia), Some(ib)) => i64::from_be_bytes(ia).cmp(&i64::from_be_bytes(ib)),
                _ => a.cmp(b),
            },
            KeyScheme::Single(_) => a.cmp(b),
        }
    }
}

fn to_array<const N: usize>(bytes: &[u8]) -> Option<[u8; N]> {
    bytes.try_into().ok()
}

/// What a table stores as column values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Monotonic 64-bit accumulator, written through increments rather
    /// than ordinary puts.
    Counter,
}

/// A secondary-index column definition: which typed fields, in which
/// directions, the index key is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondaryIndex {
    column: &'static str,
    fields: &'static [(Tag, Direction)],
}

impl SecondaryIndex {
    pub const fn new(column: &'static str, fields: &'static [(Tag, Direction)]) -> Self {
        Self { column, fields }
    }

    pub fn column(&self) -> &'static str {
        self.column
    }

    pub fn fields(&self) -> &'static [(Tag, Direction)] {
        self.fields
    }
}

/// Immutable description of one storage table: its name, key ordering,
/// value constraint, index definitions, and whether this process is
/// allowed to create it.
///
/// Tables shared with another subsystem are marked externally owned so
/// that bootstrap validates their existence instead of provisioning a
/// second, conflicting definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnFamilyDescriptor {
    name: &'static str,
    key_scheme: KeyScheme,
    value_kind: Option<ValueKind>,
    secondary_indexes: &'static [SecondaryIndex],
    auto_create: bool,
}

impl ColumnFamilyDescriptor {
    pub const fn new(name: &'static str, key_scheme: KeyScheme) -> Self {
        Self {
            name,
            key_scheme,
            value_kind: None,
            secondary_indexes: &[],
            auto_create: true,
        }
    }

    /// Mark the table as provisioned by another subsystem.
    pub const fn externally_owned(mut self) -> Self {
        self.auto_create = false;
        self
    }

    /// Constrain values to the counter kind.
    pub const fn with_counter_values(mut self) -> Self {
        self.value_kind = Some(ValueKind::Counter);
        self
    }

    pub const fn with_secondary_indexes(mut self, indexes: &'static [SecondaryIndex]) -> Self {
        self.secondary_indexes = indexes;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn key_scheme(&self) -> KeyScheme {
        self.key_scheme
    }

    pub fn value_kind(&self) -> Option<ValueKind> {
        self.value_kind
    }

    pub fn secondary_indexes(&self) -> &'static [SecondaryIndex] {
        self.secondary_indexes
    }

    pub fn auto_create(&self) -> bool {
        self.auto_create
    }

    pub fn is_composite(&self) -> bool {
        self.key_scheme == KeyScheme::Composite
    }

    pub fn is_counter(&self) -> bool {
        self.value_kind == Some(ValueKind::Counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quarry_keys::{TimeUuid, TypedValue, encode_key};

    #[test]
    fn test_descriptor_builders() {
        let table = ColumnFamilyDescriptor::new("example", KeyScheme::Bytes);
        assert!(table.auto_create());
        assert!(!table.is_counter());

        let external = table.externally_owned();
        assert!(!external.auto_create());

        let counter = ColumnFamilyDescriptor::new("counts", KeyScheme::Bytes).with_counter_values();
        assert!(counter.is_counter());
        assert_eq!(counter.value_kind(), Some(ValueKind::Counter));
    }

    #[test]
    fn test_secondary_index_fields() {
        static FIELDS: [(Tag, Direction); 2] = [
            (Tag::Ascii, Direction::Ascending),
            (Tag::TimeUuid, Direction::Descending),
        ];
        let index = SecondaryIndex::new("by_name", &FIELDS);
        assert_eq!(index.column(), "by_name");
        assert_eq!(index.fields().len(), 2);
    }

    #[test]
    fn test_bytes_scheme_compares_lexicographically() {
        let scheme = KeyScheme::Bytes;
        assert_eq!(scheme.compare(b"a", b"b"), Ordering::Less);
        assert_eq!(scheme.compare(b"b", b"ab"), Ordering::Greater);
        assert_eq!(scheme.compare(b"a", b"a"), Ordering::Equal);
    }

    #[test]
    fn test_time_uuid_scheme_compares_chronologically() {
        let node = [0x01, 0, 0, 0, 0, 0];
        // time_low rolls over between these two, so raw byte order and
        // chronological order disagree.
        let older = TimeUuid::from_timestamp(u32::MAX as u64, 0, &node);
        let newer = TimeUuid::from_timestamp(u32::MAX as u64 + 1, 0, &node);
        let a = older.as_uuid().as_bytes().to_vec();
        let b = newer.as_uuid().as_bytes().to_vec();
        assert_eq!(Ordering::Greater, a.cmp(&b));

        let scheme = KeyScheme::Single(Tag::TimeUuid);
        assert_eq!(scheme.compare(&a, &b), Ordering::Less);
        assert_eq!(scheme.compare(&b, &a), Ordering::Greater);
        assert_eq!(scheme.compare(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_int64_scheme_compares_signed() {
        let scheme = KeyScheme::Single(Tag::Int64);
        let neg = (-5i64).to_be_bytes();
        let pos = 3i64.to_be_bytes();
        assert_eq!(scheme.compare(&neg, &pos), Ordering::Less);
    }

    #[test]
    fn test_composite_scheme_matches_codec_order() {
        let scheme = KeyScheme::Composite;
        let a = encode_key(&[
            (TypedValue::Ascii("users".into()), Direction::Ascending),
            (TypedValue::Int64(1), Direction::Ascending),
        ])
        .unwrap();
        let b = encode_key(&[
            (TypedValue::Ascii("users".into()), Direction::Ascending),
            (TypedValue::Int64(2), Direction::Ascending),
        ])
        .unwrap();
        assert_eq!(scheme.compare(&a, &b), Ordering::Less);
    }
}
