//! Typed access to the persisted state of the active deposit.

use std::sync::Arc;

use minter_primitives::prelude::*;
use serde::{de::DeserializeOwned, Serialize};
use tracing::*;

use crate::{errors::DbError, traits::KvStore, DbResult};

pub const ACTIVE_DEPOSIT_NUMBER_KEY: &str = "activeDepositNumber";
pub const COMPUTED_ETH_PROOF_KEY: &str = "computedEthProof";
pub const DEPOSIT_MINT_TX_KEY: &str = "depositMintTx";

/// Every key written by [`DepositStore`].
pub const DEPOSIT_KEYS: [&str; 3] = [
    ACTIVE_DEPOSIT_NUMBER_KEY,
    COMPUTED_ETH_PROOF_KEY,
    DEPOSIT_MINT_TX_KEY,
];

/// Deposit artifacts as found in the store.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PersistedDeposit {
    pub active_deposit_number: Option<u64>,
    pub computed_eth_proof: Option<EthDepositProof>,
    pub deposit_mint_tx: Option<MinaTransaction>,
}

impl PersistedDeposit {
    pub fn is_empty(&self) -> bool {
        self.active_deposit_number.is_none()
            && self.computed_eth_proof.is_none()
            && self.deposit_mint_tx.is_none()
    }
}

/// Stores the artifacts of the active deposit as JSON values under fixed keys.
#[derive(Debug)]
pub struct DepositStore<S> {
    store: Arc<S>,
}

impl<S> Clone for DepositStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: KvStore> DepositStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn load(&self) -> DbResult<PersistedDeposit> {
        Ok(PersistedDeposit {
            active_deposit_number: self.get_json(ACTIVE_DEPOSIT_NUMBER_KEY)?,
            computed_eth_proof: self.get_json(COMPUTED_ETH_PROOF_KEY)?,
            deposit_mint_tx: self.get_json(DEPOSIT_MINT_TX_KEY)?,
        })
    }

    pub fn persist_deposit_number(&self, deposit_number: u64) -> DbResult<()> {
        self.set_json(ACTIVE_DEPOSIT_NUMBER_KEY, &deposit_number)
    }

    pub fn persist_proof(&self, proof: &EthDepositProof) -> DbResult<()> {
        self.set_json(COMPUTED_ETH_PROOF_KEY, proof)
    }

    pub fn persist_mint_tx(&self, tx: &MinaTransaction) -> DbResult<()> {
        self.set_json(DEPOSIT_MINT_TX_KEY, tx)
    }

    /// Removes every deposit key. There is no way to clear a single one.
    pub fn clear(&self) -> DbResult<()> {
        for key in DEPOSIT_KEYS {
            self.store.delete(key)?;
        }
        debug!("cleared persisted deposit state");
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, key: &'static str) -> DbResult<Option<T>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };

        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| DbError::MalformedValue {
                key,
                reason: e.to_string(),
            })
    }

    fn set_json<T: Serialize + ?Sized>(&self, key: &'static str, value: &T) -> DbResult<()> {
        let raw = serde_json::to_string(value).map_err(|e| DbError::Encode {
            key,
            reason: e.to_string(),
        })?;
        self.store.set(key, raw)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::stubs::StubKvStore;

    #[test]
    fn test_empty_store() {
        let store = DepositStore::new(Arc::new(StubKvStore::new()));
        let loaded = store.load().unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_persist_and_load() {
        let kv = Arc::new(StubKvStore::new());
        let store = DepositStore::new(kv.clone());

        let proof = EthDepositProof::new(json!({ "root": "0xabc", "path": [1, 2] }));
        let tx = MinaTransaction::new("{\"zkappCommand\":{}}");

        store.persist_deposit_number(500).unwrap();
        store.persist_proof(&proof).unwrap();
        store.persist_mint_tx(&tx).unwrap();

        assert_eq!(kv.get(ACTIVE_DEPOSIT_NUMBER_KEY).unwrap().unwrap(), "500");

        let loaded = store.load().unwrap();
        assert_eq!(loaded.active_deposit_number, Some(500));
        assert_eq!(loaded.computed_eth_proof, Some(proof));
        assert_eq!(loaded.deposit_mint_tx, Some(tx));
    }

    #[test]
    fn test_clear_removes_everything() {
        let kv = Arc::new(StubKvStore::new());
        let store = DepositStore::new(kv.clone());
        store.persist_deposit_number(7).unwrap();
        store
            .persist_mint_tx(&MinaTransaction::new("tx"))
            .unwrap();

        store.clear().unwrap();
        assert!(kv.is_empty());

        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_only_mint_tx_present() {
        let kv = Arc::new(StubKvStore::with_entries([(DEPOSIT_MINT_TX_KEY, "\"signed\"")]));
        let loaded = DepositStore::new(kv).load().unwrap();

        assert_eq!(loaded.active_deposit_number, None);
        assert_eq!(loaded.computed_eth_proof, None);
        assert_eq!(loaded.deposit_mint_tx, Some(MinaTransaction::new("signed")));
    }

    #[test]
    fn test_malformed_value() {
        let kv = Arc::new(StubKvStore::with_entries([(
            ACTIVE_DEPOSIT_NUMBER_KEY,
            "not-a-number",
        )]));
        let err = DepositStore::new(kv).load().unwrap_err();
        assert!(matches!(
            err,
            DbError::MalformedValue {
                key: ACTIVE_DEPOSIT_NUMBER_KEY,
                ..
            }
        ));
    }
}
