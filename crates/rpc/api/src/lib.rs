//! Macro trait def for the `minter_` RPC namespace using jsonrpsee.
//!
//! Commands return whether the orchestrator accepted them in its current state. A rejected
//! command is not an error, the caller is expected to check the deposit state.
use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use minter_orchestrator::OrchestratorView;
use minter_primitives::prelude::*;

#[cfg_attr(not(feature = "client"), rpc(server, namespace = "minter"))]
#[cfg_attr(feature = "client", rpc(server, client, namespace = "minter"))]
pub trait MinterApi {
    #[method(name = "getClientVersion")]
    async fn get_client_version(&self) -> RpcResult<String>;

    /// Seconds since the client started.
    #[method(name = "uptime")]
    async fn uptime(&self) -> RpcResult<u64>;

    /// Starts tracking the deposit included at source chain block `deposit_number`.
    #[method(name = "setDepositNumber")]
    async fn set_deposit_number(&self, deposit_number: u64) -> RpcResult<bool>;

    /// Submits the mint transaction recovered from the store.
    #[method(name = "submitMintTx")]
    async fn submit_mint_tx(&self) -> RpcResult<bool>;

    /// Forgets the active deposit and clears everything persisted for it.
    #[method(name = "reset")]
    async fn reset(&self) -> RpcResult<bool>;

    /// Retries the failed proof computation.
    #[method(name = "retry")]
    async fn retry(&self) -> RpcResult<bool>;

    #[method(name = "getDepositState")]
    async fn get_deposit_state(&self) -> RpcResult<OrchestratorView>;

    /// Latest status of the monitored deposit, if any.
    #[method(name = "getDepositSnapshot")]
    async fn get_deposit_snapshot(&self) -> RpcResult<Option<DepositSnapshot>>;
}
