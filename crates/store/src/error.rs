//! Error types for the wide-column store

use quarry_schema::SchemaError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] fjall::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    /// An externally owned table was missing at startup.
    #[error("Table not provisioned: {0}")]
    TableNotProvisioned(String),

    #[error("Not a counter table: {0}")]
    NotACounter(String),

    #[error("Invalid counter value in {table}: expected 8 bytes, found {len}")]
    InvalidCounterValue { table: String, len: usize },

    #[error("Row key too large: {0} bytes")]
    RowTooLarge(usize),
}
