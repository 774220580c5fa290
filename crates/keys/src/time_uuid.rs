//! Time-ordered UUIDs.
//!
//! A [`TimeUuid`] wraps an RFC 4122 version 1 UUID, whose 60-bit Gregorian
//! timestamp is split across the `time_low`/`time_mid`/`time_hi` fields in
//! non-chronological byte positions. [`TimeUuid::ordered_bytes`] permutes
//! the fields timestamp-major so that byte order equals chronological
//! order, which is the form the key codec writes.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::{Timestamp, Uuid};

use crate::codec::{Error, Result};

/// Node id used for UUIDs generated by this process. Random per process,
/// with the multicast bit set to mark it as non-hardware per RFC 4122.
static NODE_ID: LazyLock<[u8; 6]> = LazyLock::new(|| {
    let seed = Uuid::new_v4();
    let mut node = [0u8; 6];
    node.copy_from_slice(&seed.as_bytes()[..6]);
    node[0] |= 0x01;
    node
});

/// Byte positions of the version 1 timestamp fields, most significant
/// first: `time_hi_and_version`, `time_mid`, `time_low`.
const TIMESTAMP_MAJOR: [usize; 8] = [6, 7, 4, 5, 0, 1, 2, 3];

/// Permute raw version 1 UUID bytes timestamp-major, so that lexicographic
/// byte order equals chronological order. Single-type comparators apply
/// this to both operands before comparing.
pub fn timestamp_major(bytes: [u8; 16]) -> [u8; 16] {
    let mut out = [0u8; 16];
    for (i, &pos) in TIMESTAMP_MAJOR.iter().enumerate() {
        out[i] = bytes[pos];
    }
    out[8..].copy_from_slice(&bytes[8..]);
    out
}

fn unpermute(bytes: [u8; 16]) -> [u8; 16] {
    let mut out = [0u8; 16];
    for (i, &pos) in TIMESTAMP_MAJOR.iter().enumerate() {
        out[pos] = bytes[i];
    }
    out[8..].copy_from_slice(&bytes[8..]);
    out
}

/// A validated version 1 (time-based) UUID.
///
/// Ordering compares the timestamp-major permuted form, so `a < b` means
/// `a` was generated earlier (ties broken by clock sequence and node id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeUuid(Uuid);

// Manual Deserialize so the version check cannot be bypassed.
impl<'de> Deserialize<'de> for TimeUuid {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let uuid = Uuid::deserialize(deserializer)?;
        TimeUuid::from_uuid(uuid).map_err(serde::de::Error::custom)
    }
}

impl TimeUuid {
    /// Generate a new time-ordered UUID from the system clock.
    pub fn now() -> Self {
        Self(Uuid::now_v1(&NODE_ID))
    }

    /// Build a time-ordered UUID from an explicit timestamp.
    ///
    /// `ticks` counts 100-nanosecond intervals since the Gregorian epoch
    /// (1582-10-15); `counter` is the 14-bit clock sequence. Useful for
    /// constructing range-scan boundary keys at a chosen instant.
    pub fn from_timestamp(ticks: u64, counter: u16, node_id: &[u8; 6]) -> Self {
        let ts = Timestamp::from_gregorian_time(ticks, counter);
        Self(Uuid::new_v1(ts, node_id))
    }

    /// Wrap an existing UUID, rejecting anything that is not version 1.
    pub fn from_uuid(uuid: Uuid) -> Result<Self> {
        if uuid.get_version_num() != 1 {
            return Err(Error::Encoding(format!(
                "time-ordered uuid must be version 1, got version {}",
                uuid.get_version_num()
            )));
        }
        Ok(Self(uuid))
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// The raw 60-bit timestamp, in 100-nanosecond Gregorian ticks.
    pub fn ticks(&self) -> u64 {
        let b = self.0.as_bytes();
        let time_low = u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as u64;
        let time_mid = u16::from_be_bytes([b[4], b[5]]) as u64;
        let time_hi = (u16::from_be_bytes([b[6], b[7]]) & 0x0FFF) as u64;
        (time_hi << 48) | (time_mid << 32) | time_low
    }

    /// The 16 bytes permuted timestamp-major, so that lexicographic byte
    /// order equals chronological order.
    pub fn ordered_bytes(&self) -> [u8; 16] {
        timestamp_major(*self.0.as_bytes())
    }

    /// Invert [`ordered_bytes`](Self::ordered_bytes).
    pub fn from_ordered_bytes(bytes: [u8; 16]) -> Result<Self> {
        let uuid = Uuid::from_bytes(unpermute(bytes));
        if uuid.get_version_num() != 1 {
            return Err(Error::Decoding(format!(
                "decoded uuid is not time-ordered (version {})",
                uuid.get_version_num()
            )));
        }
        Ok(Self(uuid))
    }
}

impl PartialOrd for TimeUuid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimeUuid {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ordered_bytes().cmp(&other.ordered_bytes())
    }
}

impl fmt::Display for TimeUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
