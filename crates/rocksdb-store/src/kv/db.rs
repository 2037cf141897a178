use std::sync::Arc;

use minter_db::{errors::DbError, traits::KvStore, DbResult};
use rockbound::{OptimisticTransactionDB as DB, SchemaDBOperationsExt, TransactionRetry};

use super::schemas::DepositKvSchema;
use crate::DbOpsConfig;

pub struct RocksKvStore {
    db: Arc<DB>,
    ops: DbOpsConfig,
}

impl RocksKvStore {
    pub fn new(db: Arc<DB>, ops: DbOpsConfig) -> Self {
        Self { db, ops }
    }
}

impl std::fmt::Debug for RocksKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksKvStore")
            .field("ops", &self.ops)
            .finish_non_exhaustive()
    }
}

impl KvStore for RocksKvStore {
    fn get(&self, key: &str) -> DbResult<Option<String>> {
        Ok(self.db.get::<DepositKvSchema>(&key.to_string())?)
    }

    fn set(&self, key: &str, value: String) -> DbResult<()> {
        let key = key.to_string();
        self.db
            .with_optimistic_txn(TransactionRetry::Count(self.ops.retry_count), |txn| {
                txn.put::<DepositKvSchema>(&key, &value)?;

                Ok::<(), DbError>(())
            })
            .map_err(|e: rockbound::TransactionError<_>| DbError::TransactionError(e.to_string()))
    }

    fn delete(&self, key: &str) -> DbResult<()> {
        let key = key.to_string();
        self.db
            .with_optimistic_txn(TransactionRetry::Count(self.ops.retry_count), |txn| {
                txn.delete::<DepositKvSchema>(&key)?;

                Ok::<(), DbError>(())
            })
            .map_err(|e: rockbound::TransactionError<_>| DbError::TransactionError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use minter_db::DepositStore;
    use minter_primitives::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::test_utils::get_rocksdb_tmp_instance;

    fn setup_db() -> (RocksKvStore, tempfile::TempDir) {
        let (db, db_ops, dir) = get_rocksdb_tmp_instance().unwrap();
        (RocksKvStore::new(db, db_ops), dir)
    }

    #[test]
    fn test_get_set_delete() {
        let (db, _dir) = setup_db();

        assert_eq!(db.get("missing").unwrap(), None);

        db.set("activeDepositNumber", "42".to_string()).unwrap();
        assert_eq!(
            db.get("activeDepositNumber").unwrap().as_deref(),
            Some("42")
        );

        db.set("activeDepositNumber", "43".to_string()).unwrap();
        assert_eq!(
            db.get("activeDepositNumber").unwrap().as_deref(),
            Some("43"),
            "set should overwrite the previous value"
        );

        db.delete("activeDepositNumber").unwrap();
        assert_eq!(db.get("activeDepositNumber").unwrap(), None);

        // deleting a missing key is fine
        db.delete("activeDepositNumber").unwrap();
    }

    #[test]
    fn test_deposit_store_on_rocksdb() {
        let (db, _dir) = setup_db();
        let store = DepositStore::new(Arc::new(db));

        let proof = EthDepositProof::new(json!({ "proof": [1, 2, 3] }));
        store.persist_deposit_number(500).unwrap();
        store.persist_proof(&proof).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.active_deposit_number, Some(500));
        assert_eq!(loaded.computed_eth_proof, Some(proof));
        assert_eq!(loaded.deposit_mint_tx, None);

        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
    }
}
