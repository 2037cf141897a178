//! Durable storage interface for the deposit orchestrator.

pub mod deposit;
pub mod errors;
pub mod traits;

#[cfg(any(test, feature = "stubs"))]
pub mod stubs;

/// Wrapper result type for database operations.
pub type DbResult<T> = anyhow::Result<T, errors::DbError>;

pub use deposit::{DepositStore, PersistedDeposit};
pub use errors::DbError;
pub use traits::KvStore;
