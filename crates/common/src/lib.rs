//! Common model types for the Quarry persistence core
//!
//! This crate defines:
//! - Multi-tenant collection scopes (application / owner / collection name)
//! - Typed entity identifiers and committed entity versions

mod entity;
mod scope;

pub use entity::{EntityId, EntityVersion};
pub use scope::CollectionScope;
