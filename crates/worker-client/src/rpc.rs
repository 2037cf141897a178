//! [`WorkerClient`] over the worker's JSON-RPC API.

use async_trait::async_trait;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use minter_primitives::prelude::*;
use minter_worker_rpc_api::MinterWorkerApiClient;
use tracing::*;

use crate::{traits::WorkerClient, WorkerResult};

#[derive(Debug, Clone)]
pub struct RpcWorkerClient {
    client: HttpClient,
}

impl RpcWorkerClient {
    pub fn new(http_url: &str) -> WorkerResult<Self> {
        let client = HttpClientBuilder::default().build(http_url)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WorkerClient for RpcWorkerClient {
    async fn needs_to_setup_storage(
        &self,
        eth_address: &EthAddress,
        mina_address: &MinaAddress,
    ) -> WorkerResult<bool> {
        trace!(%eth_address, %mina_address, "checking storage setup");
        Ok(self
            .client
            .needs_to_setup_storage(eth_address.clone(), mina_address.clone())
            .await?)
    }

    async fn setup_storage(&self, mina_address: &MinaAddress) -> WorkerResult<MinaTransaction> {
        Ok(self.client.setup_storage(mina_address.clone()).await?)
    }

    async fn compute_eth_deposit(
        &self,
        code_verifier: &CodeVerifier,
        deposit_block: u64,
    ) -> WorkerResult<EthDepositProof> {
        debug!(%deposit_block, "requesting deposit proof");
        Ok(self
            .client
            .compute_eth_deposit(code_verifier.clone(), deposit_block)
            .await?)
    }

    async fn compute_mint_tx(
        &self,
        proof: &EthDepositProof,
        code_verifier: &CodeVerifier,
        needs_to_fund_account: bool,
    ) -> WorkerResult<MinaTransaction> {
        Ok(self
            .client
            .compute_mint_tx(proof.clone(), code_verifier.clone(), needs_to_fund_account)
            .await?)
    }

    async fn needs_to_fund_account(&self) -> WorkerResult<bool> {
        Ok(self.client.needs_to_fund_account().await?)
    }

    async fn submit_transaction(&self, tx: &MinaTransaction) -> WorkerResult<TxHash> {
        Ok(self.client.submit_transaction(tx.clone()).await?)
    }
}
