//! Trait definitions for the low level storage interface.

use crate::DbResult;

/// String keyed store of string values.
///
/// Access is synchronous and the store is exclusively owned by a single writer, so
/// implementations don't need to guard against concurrent writers on the same key.
pub trait KvStore: Send + Sync + 'static {
    /// Gets the value stored under `key`, if any.
    fn get(&self, key: &str) -> DbResult<Option<String>>;

    /// Stores `value` under `key`, overwriting whatever was there.
    fn set(&self, key: &str, value: String) -> DbResult<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> DbResult<()>;
}
