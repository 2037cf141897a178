//! Control RPC server for the deposit orchestrator.
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonrpsee::core::RpcResult;
use minter_orchestrator::{OrchestratorHandle, OrchestratorView};
use minter_primitives::prelude::*;
use minter_rpc_api::MinterApiServer;
use minter_tasks::ShutdownGuard;
use tracing::*;

use crate::errors::RpcServerError;

pub(crate) async fn start(
    rpc_impl: MinterRpc,
    addr: &str,
    shutdown: ShutdownGuard,
) -> anyhow::Result<()> {
    let rpc_module = rpc_impl.into_rpc();

    let rpc_server = jsonrpsee::server::ServerBuilder::new()
        .build(addr)
        .await
        .with_context(|| format!("building rpc server at {addr}"))?;

    let rpc_handle = rpc_server.start(rpc_module);
    info!(%addr, "minter RPC server started");

    shutdown.wait_for_shutdown().await;
    info!("stopping RPC server");

    if rpc_handle.stop().is_err() {
        warn!("rpc server already stopped");
    }
    rpc_handle.stopped().await;

    Ok(())
}

/// Implements [`MinterApiServer`] on top of a running orchestrator.
#[derive(Clone, Debug)]
pub(crate) struct MinterRpc {
    start_time: DateTime<Utc>,
    orchestrator: OrchestratorHandle,
}

impl MinterRpc {
    pub(crate) fn new(orchestrator: OrchestratorHandle) -> Self {
        Self {
            start_time: Utc::now(),
            orchestrator,
        }
    }
}

#[async_trait]
impl MinterApiServer for MinterRpc {
    async fn get_client_version(&self) -> RpcResult<String> {
        Ok(env!("CARGO_PKG_VERSION").to_string())
    }

    async fn uptime(&self) -> RpcResult<u64> {
        let current_time = Utc::now().timestamp();
        let start_time = self.start_time.timestamp();

        // The user might care about their system time being incorrect.
        if current_time < start_time {
            return Err(RpcServerError::ClockSkew(current_time - start_time).into());
        }

        Ok(current_time.abs_diff(start_time))
    }

    async fn set_deposit_number(&self, deposit_number: u64) -> RpcResult<bool> {
        let accepted = self
            .orchestrator
            .set_deposit_number(deposit_number)
            .await
            .map_err(RpcServerError::from)?;
        debug!(%deposit_number, %accepted, "set deposit number");
        Ok(accepted)
    }

    async fn submit_mint_tx(&self) -> RpcResult<bool> {
        Ok(self
            .orchestrator
            .submit_mint_tx()
            .await
            .map_err(RpcServerError::from)?)
    }

    async fn reset(&self) -> RpcResult<bool> {
        Ok(self.orchestrator.reset().await.map_err(RpcServerError::from)?)
    }

    async fn retry(&self) -> RpcResult<bool> {
        Ok(self.orchestrator.retry().await.map_err(RpcServerError::from)?)
    }

    async fn get_deposit_state(&self) -> RpcResult<OrchestratorView> {
        Ok(self.orchestrator.view())
    }

    async fn get_deposit_snapshot(&self) -> RpcResult<Option<DepositSnapshot>> {
        Ok(self.orchestrator.view().snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use minter_db::{stubs::StubKvStore, DepositStore};
    use minter_orchestrator::{build_orchestrator, OrchestratorConfig};
    use minter_status::FeedChannel;
    use minter_worker_client::MockWorkerClient;

    use super::*;

    fn rpc_with_worker(worker: MockWorkerClient) -> MinterRpc {
        let config = OrchestratorConfig::new(
            "0xdepositor".parse().unwrap(),
            "B62recipient".parse().unwrap(),
            CodeVerifier::new("verifier"),
        );
        let (handle, task) = build_orchestrator(
            config,
            Arc::new(worker),
            DepositStore::new(Arc::new(StubKvStore::new())),
            FeedChannel::new(),
        );
        tokio::spawn(task.run(std::future::pending()));
        MinterRpc::new(handle)
    }

    async fn wait_for_state(rpc: &MinterRpc, name: &str) {
        let mut rx = rpc.orchestrator.subscribe();
        tokio::time::timeout(
            Duration::from_secs(5),
            rx.wait_for(|view| view.state.name() == name),
        )
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {name}"))
        .unwrap();
    }

    #[tokio::test]
    async fn test_zero_deposit_number_rejected() {
        let rpc = rpc_with_worker(MockWorkerClient::new());
        wait_for_state(&rpc, "noActiveDepositNumber").await;

        let err = rpc.set_deposit_number(0).await.unwrap_err();
        assert_eq!(err.code(), -32602);
    }

    #[tokio::test]
    async fn test_set_deposit_number() {
        let mut worker = MockWorkerClient::new();
        worker
            .expect_needs_to_setup_storage()
            .returning(|_, _| Ok(false));

        let rpc = rpc_with_worker(worker);
        wait_for_state(&rpc, "noActiveDepositNumber").await;

        assert!(rpc.set_deposit_number(500).await.unwrap());
        // no longer accepted once a deposit is active
        assert!(!rpc.set_deposit_number(501).await.unwrap());
        assert!(!rpc.submit_mint_tx().await.unwrap());

        let view = rpc.get_deposit_state().await.unwrap();
        assert_eq!(view.context.active_deposit_number, Some(500));
        assert!(rpc.get_deposit_snapshot().await.unwrap().is_none());

        assert!(rpc.reset().await.unwrap());
        wait_for_state(&rpc, "noActiveDepositNumber").await;
    }

    #[tokio::test]
    async fn test_uptime_right_after_start() {
        let rpc = rpc_with_worker(MockWorkerClient::new());
        assert!(rpc.uptime().await.unwrap() <= 1);
    }

    #[tokio::test]
    async fn test_uptime_clock_skew() {
        let mut rpc = rpc_with_worker(MockWorkerClient::new());
        rpc.start_time = Utc::now() + chrono::Duration::seconds(60);

        let err = rpc.uptime().await.unwrap_err();
        assert_eq!(err.code(), -32000);
    }

    #[tokio::test]
    async fn test_client_version() {
        let rpc = rpc_with_worker(MockWorkerClient::new());
        assert_eq!(
            rpc.get_client_version().await.unwrap(),
            env!("CARGO_PKG_VERSION")
        );
    }
}
