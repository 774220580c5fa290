//! Quarry Schema - Static column-family catalog
//!
//! This crate defines:
//! - Immutable descriptors for every storage table (key-ordering scheme,
//!   value-type constraint, index definitions, provisioning ownership)
//! - The fixed catalog the storage bootstrap provisions from
//! - Keyspace naming for the static and per-application table sets
//!
//! The catalog is populated once as static data and is safe for
//! unsynchronized concurrent reads for the process lifetime.

pub mod catalog;
pub mod descriptor;
mod error;

pub use catalog::{
    APPLICATION_KEYSPACE_SUFFIX, MESSAGES_KEYSPACE, application_keyspace, catalog, describe,
    tables,
};
pub use descriptor::{ColumnFamilyDescriptor, KeyScheme, SecondaryIndex, ValueKind};
pub use error::{Result, SchemaError};
