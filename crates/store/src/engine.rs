//! Fjall-backed wide-column store
//!
//! One keyspace partition per catalog table. Column keys within a row are
//! stored as `[row_len: u16 BE][row][column]`, so a row scan is an exact
//! prefix scan and rows whose keys share a prefix never bleed into each
//! other. Column order within a row is byte order, which for codec-encoded
//! column names is the declared semantic order.

use std::collections::{HashMap, HashSet};

use fjall::{Keyspace, Partition, PartitionCreateOptions};
use parking_lot::Mutex;
use quarry_schema::{ColumnFamilyDescriptor, SchemaError};

use crate::config::StoreConfig;
use crate::error::{Error, Result};

/// Width of a counter accumulator value.
const COUNTER_VALUE_LEN: usize = 8;

struct TableHandle {
    descriptor: &'static ColumnFamilyDescriptor,
    partition: Partition,
}

/// Wide-column storage over a fixed table catalog.
///
/// Opened once at startup from a catalog of [`ColumnFamilyDescriptor`]s:
/// auto-create tables are provisioned, externally owned tables are
/// validated. The catalog never changes after open, so lookups are
/// lock-free and an unknown table name is always a caller error.
pub struct WideColumnStore {
    keyspace: Keyspace,
    tables: HashMap<&'static str, TableHandle>,
    // Serializes read-modify-write cycles on counter columns.
    counter_lock: Mutex<()>,
    persist_mode: fjall::PersistMode,
}

impl WideColumnStore {
    /// Open the keyspace and provision the catalog.
    ///
    /// Every `auto_create` table is opened (created on first run). Tables
    /// owned by another subsystem must already exist; a missing one fails
    /// startup with [`Error::TableNotProvisioned`] rather than silently
    /// creating a table under a definition its owner never agreed to.
    pub fn open(config: StoreConfig, catalog: &'static [ColumnFamilyDescriptor]) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let keyspace = fjall::Config::new(&config.data_dir)
            .cache_size(config.block_cache_size)
            .open()?;

        let existing: HashSet<String> = keyspace
            .list_partitions()
            .into_iter()
            .map(|name| name.to_string())
            .collect();

        let mut tables = HashMap::with_capacity(catalog.len());
        for descriptor in catalog {
            if !descriptor.auto_create() && !existing.contains(descriptor.name()) {
                return Err(Error::TableNotProvisioned(descriptor.name().to_string()));
            }

            let created = !existing.contains(descriptor.name());
            let partition =
                keyspace.open_partition(descriptor.name(), partition_options(descriptor, &config))?;
            if created {
                tracing::debug!(table = descriptor.name(), "provisioned table");
            }
            tables.insert(descriptor.name(), TableHandle { descriptor, partition });
        }

        tracing::info!(
            path = %config.data_dir.display(),
            tables = tables.len(),
            "wide-column store open"
        );

        Ok(Self {
            keyspace,
            tables,
            counter_lock: Mutex::new(()),
            persist_mode: config.persist_mode,
        })
    }

    /// Names of the tables this store serves.
    pub fn tables(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tables.keys().copied()
    }

    /// Write one column value.
    ///
    /// Counter tables only accept 8-byte accumulator values here; ordinary
    /// writes to them are resets, and everything else goes through
    /// [`increment`](Self::increment).
    pub fn put(&self, table: &str, row: &[u8], column: &[u8], value: &[u8]) -> Result<()> {
        let handle = self.table(table)?;
        if handle.descriptor.is_counter() && value.len() != COUNTER_VALUE_LEN {
            return Err(Error::InvalidCounterValue {
                table: table.to_string(),
                len: value.len(),
            });
        }
        handle.partition.insert(physical_key(row, column)?, value)?;
        Ok(())
    }

    /// Read one column value.
    pub fn get(&self, table: &str, row: &[u8], column: &[u8]) -> Result<Option<Vec<u8>>> {
        let handle = self.table(table)?;
        let value = handle.partition.get(physical_key(row, column)?)?;
        Ok(value.map(|slice| slice.to_vec()))
    }

    /// Remove one column.
    pub fn delete(&self, table: &str, row: &[u8], column: &[u8]) -> Result<()> {
        let handle = self.table(table)?;
        handle.partition.remove(physical_key(row, column)?)?;
        Ok(())
    }

    /// All columns of a row, in column byte order.
    pub fn scan_row(&self, table: &str, row: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.scan_row_prefix(table, row, &[])
    }

    /// Columns of a row whose names start with `column_prefix`, in column
    /// byte order.
    pub fn scan_row_prefix(
        &self,
        table: &str,
        row: &[u8],
        column_prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let handle = self.table(table)?;
        let prefix = physical_key(row, column_prefix)?;
        let column_start = prefix.len() - column_prefix.len();

        let mut columns = Vec::new();
        for entry in handle.partition.prefix(prefix) {
            let (key, value) = entry?;
            columns.push((key[column_start..].to_vec(), value.to_vec()));
        }
        Ok(columns)
    }

    /// Add `delta` to a counter column, returning the new value.
    ///
    /// Missing counters start at zero. The read-modify-write runs under an
    /// internal lock, so concurrent increments never lose updates.
    pub fn increment(&self, table: &str, row: &[u8], column: &[u8], delta: i64) -> Result<i64> {
        let handle = self.table(table)?;
        if !handle.descriptor.is_counter() {
            return Err(Error::NotACounter(table.to_string()));
        }
        let key = physical_key(row, column)?;

        let _guard = self.counter_lock.lock();
        let current = match handle.partition.get(&key)? {
            Some(bytes) => decode_counter(table, &bytes)?,
            None => 0,
        };
        let next = current.wrapping_add(delta);
        handle.partition.insert(key, next.to_be_bytes())?;
        Ok(next)
    }

    /// Read a counter column; missing counters read as zero.
    pub fn counter(&self, table: &str, row: &[u8], column: &[u8]) -> Result<i64> {
        let handle = self.table(table)?;
        if !handle.descriptor.is_counter() {
            return Err(Error::NotACounter(table.to_string()));
        }
        match handle.partition.get(physical_key(row, column)?)? {
            Some(bytes) => decode_counter(table, &bytes),
            None => Ok(0),
        }
    }

    /// Flush the keyspace through the configured persist mode.
    pub fn persist(&self) -> Result<()> {
        self.keyspace.persist(self.persist_mode)?;
        Ok(())
    }

    fn table(&self, name: &str) -> Result<&TableHandle> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::Schema(SchemaError::UnknownTable(name.to_string())))
    }
}

fn partition_options(
    descriptor: &ColumnFamilyDescriptor,
    config: &StoreConfig,
) -> PartitionCreateOptions {
    if descriptor.is_counter() {
        // Counter values are 8 bytes; small blocks, nothing worth compressing.
        PartitionCreateOptions::default()
            .block_size(16 * 1024)
            .compression(fjall::CompressionType::None)
    } else {
        PartitionCreateOptions::default()
            .block_size(64 * 1024)
            .compression(config.compression)
    }
}

/// Build the `[row_len: u16 BE][row][column]` storage key.
fn physical_key(row: &[u8], column: &[u8]) -> Result<Vec<u8>> {
    let row_len = u16::try_from(row.len()).map_err(|_| Error::RowTooLarge(row.len()))?;
    let mut key = Vec::with_capacity(2 + row.len() + column.len());
    key.extend_from_slice(&row_len.to_be_bytes());
    key.extend_from_slice(row);
    key.extend_from_slice(column);
    Ok(key)
}

fn decode_counter(table: &str, bytes: &[u8]) -> Result<i64> {
    let value: [u8; COUNTER_VALUE_LEN] =
        bytes.try_into().map_err(|_| Error::InvalidCounterValue {
            table: table.to_string(),
            len: bytes.len(),
        })?;
    Ok(i64::from_be_bytes(value))
}
