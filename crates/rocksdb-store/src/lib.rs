//! RocksDB backed storage for the minter client.

pub mod kv;
pub mod macros;

#[cfg(feature = "test_utils")]
pub mod test_utils;

use rockbound::{schema::ColumnFamilyName, Schema};

use crate::kv::schemas::DepositKvSchema;

pub const ROCKSDB_NAME: &str = "minter";

pub const STORE_COLUMN_FAMILIES: &[ColumnFamilyName] = &[DepositKvSchema::COLUMN_FAMILY_NAME];

// Re-exports
pub use kv::db::RocksKvStore;

/// database operations configuration
#[derive(Clone, Copy, Debug)]
pub struct DbOpsConfig {
    pub retry_count: u16,
}

impl DbOpsConfig {
    pub fn new(retry_count: u16) -> Self {
        Self { retry_count }
    }
}
