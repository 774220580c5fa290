//! Wide-column storage boundary
//!
//! A thin put/get/scan/delete/increment surface over a `fjall` keyspace,
//! provisioned from the table catalog at startup. This crate is the
//! storage edge of the system, not a database engine: ordering semantics
//! live in the key codec and the catalog, durability in `fjall`.

pub mod config;
pub mod engine;
pub mod error;

pub use config::StoreConfig;
pub use engine::WideColumnStore;
pub use error::{Error, Result};
