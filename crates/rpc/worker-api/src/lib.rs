//! JSON-RPC interface of the proof and transaction worker.
//!
//! The worker holds the heavy machinery (credential and proof generation, transaction
//! construction and signing) and exposes it over the `worker_` namespace.

use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use minter_primitives::prelude::*;

#[cfg_attr(not(feature = "client"), rpc(server, namespace = "worker"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "worker"))]
pub trait MinterWorkerApi {
    /// Whether the destination chain storage for the address pair still has to be created.
    #[method(name = "needsToSetupStorage")]
    async fn needs_to_setup_storage(
        &self,
        eth_address: EthAddress,
        mina_address: MinaAddress,
    ) -> RpcResult<bool>;

    /// Builds the storage setup transaction for `mina_address`.
    #[method(name = "setupStorage")]
    async fn setup_storage(&self, mina_address: MinaAddress) -> RpcResult<MinaTransaction>;

    /// Computes the deposit attestation proof for the deposit included at `deposit_block`.
    #[method(name = "computeEthDeposit")]
    async fn compute_eth_deposit(
        &self,
        code_verifier: CodeVerifier,
        deposit_block: u64,
    ) -> RpcResult<EthDepositProof>;

    #[method(name = "computeMintTx")]
    async fn compute_mint_tx(
        &self,
        proof: EthDepositProof,
        code_verifier: CodeVerifier,
        needs_to_fund_account: bool,
    ) -> RpcResult<MinaTransaction>;

    /// Whether the recipient account still has to be funded by the mint transaction.
    #[method(name = "needsToFundAccount")]
    async fn needs_to_fund_account(&self) -> RpcResult<bool>;

    /// Signs and submits a transaction, returns its hash.
    #[method(name = "submitTransaction")]
    async fn submit_transaction(&self, tx: MinaTransaction) -> RpcResult<TxHash>;
}
