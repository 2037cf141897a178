use async_trait::async_trait;
use minter_primitives::prelude::*;
#[cfg(feature = "mocks")]
use mockall::automock;

use crate::WorkerResult;

/// Capabilities of the worker the mint workflow depends on.
///
/// Every call may take anywhere from seconds to minutes. No timeout is applied at this level.
#[cfg_attr(feature = "mocks", automock)]
#[async_trait]
pub trait WorkerClient: Send + Sync + 'static {
    /// Whether the destination chain storage for the address pair still has to be created.
    async fn needs_to_setup_storage(
        &self,
        eth_address: &EthAddress,
        mina_address: &MinaAddress,
    ) -> WorkerResult<bool>;

    /// Builds the storage setup transaction.
    async fn setup_storage(&self, mina_address: &MinaAddress) -> WorkerResult<MinaTransaction>;

    /// Computes the deposit attestation proof.
    async fn compute_eth_deposit(
        &self,
        code_verifier: &CodeVerifier,
        deposit_block: u64,
    ) -> WorkerResult<EthDepositProof>;

    /// Builds the mint transaction from a computed proof.
    async fn compute_mint_tx(
        &self,
        proof: &EthDepositProof,
        code_verifier: &CodeVerifier,
        needs_to_fund_account: bool,
    ) -> WorkerResult<MinaTransaction>;

    async fn needs_to_fund_account(&self) -> WorkerResult<bool>;

    /// Signs and submits a transaction.
    async fn submit_transaction(&self, tx: &MinaTransaction) -> WorkerResult<TxHash>;
}
