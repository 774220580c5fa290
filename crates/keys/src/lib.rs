//! Quarry Keys - Order-preserving composite key encoding
//!
//! This crate provides the byte-level foundation for every range query and
//! time-ordered index in the store:
//! - Typed key field values (text, bytes, integers of both widths, UUIDs)
//! - Per-field ascending/descending control
//! - An encoding whose raw byte order matches the declared field order
//!
//! The codec is pure and stateless; encoded keys are safe to compare with
//! plain `memcmp` anywhere in the system.

pub mod codec;
pub mod time_uuid;
pub mod value;

pub use codec::{
    CompositeKey, Error, Result, decode_key, decode_key_expecting, encode_field, encode_key,
};
pub use time_uuid::{TimeUuid, timestamp_major};
pub use value::{Direction, Tag, TypedValue};
