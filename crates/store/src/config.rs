//! Store placement and tuning.

use std::path::PathBuf;

/// Block cache shared across all tables unless overridden.
const DEFAULT_BLOCK_CACHE_SIZE: u64 = 32 * 1024 * 1024;

/// Settings consumed by [`WideColumnStore::open`](crate::WideColumnStore::open).
///
/// Only the data directory is required; the remaining fields start from
/// defaults suited to the catalog's tables and are adjusted through the
/// `with_*` builders. Constructing a config touches nothing on disk; the
/// data directory is created by `open`.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory the keyspace lives in.
    pub data_dir: PathBuf,

    /// Block cache size in bytes, shared across all tables.
    pub block_cache_size: u64,

    /// Compression for non-counter tables.
    pub compression: fjall::CompressionType,

    /// Flush behavior of [`persist`](crate::WideColumnStore::persist).
    pub persist_mode: fjall::PersistMode,
}

impl StoreConfig {
    /// Defaults rooted at `data_dir`: a 32 MB block cache, LZ4
    /// compression, buffered persistence.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            block_cache_size: DEFAULT_BLOCK_CACHE_SIZE,
            compression: fjall::CompressionType::Lz4,
            persist_mode: fjall::PersistMode::Buffer,
        }
    }

    pub fn with_block_cache_size(mut self, size: u64) -> Self {
        self.block_cache_size = size;
        self
    }

    pub fn with_compression(mut self, compression: fjall::CompressionType) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_persist_mode(mut self, mode: fjall::PersistMode) -> Self {
        self.persist_mode = mode;
        self
    }
}
