use std::sync::Arc;

use minter_db::{DepositStore, KvStore};
use minter_status::FeedChannel;
use minter_tasks::TaskExecutor;
use minter_worker_client::WorkerClient;
use tokio::sync::{mpsc, oneshot, watch};

use crate::{
    config::OrchestratorConfig,
    context::OrchestratorView,
    errors::OrchestratorError,
    event::DepositEvent,
    worker::{build_orchestrator, WorkerMsg},
};

/// Controls a running orchestrator.
///
/// Commands resolve once the orchestrator handled them, with `true` if the current state accepted
/// the command. The view is already updated by then.
#[derive(Clone, Debug)]
pub struct OrchestratorHandle {
    msg_tx: mpsc::UnboundedSender<WorkerMsg>,
    view_rx: watch::Receiver<OrchestratorView>,
}

impl OrchestratorHandle {
    pub(crate) fn new(
        msg_tx: mpsc::UnboundedSender<WorkerMsg>,
        view_rx: watch::Receiver<OrchestratorView>,
    ) -> Self {
        Self { msg_tx, view_rx }
    }

    /// Starts tracking the deposit made at `deposit_number`.
    pub async fn set_deposit_number(&self, deposit_number: u64) -> Result<bool, OrchestratorError> {
        if deposit_number == 0 {
            return Err(OrchestratorError::InvalidDepositNumber);
        }
        self.send(DepositEvent::SetDepositNumber(deposit_number))
            .await
    }

    /// Submits a mint transaction found in the store on startup.
    pub async fn submit_mint_tx(&self) -> Result<bool, OrchestratorError> {
        self.send(DepositEvent::SubmitMintTx).await
    }

    /// Drops the active deposit and everything persisted for it.
    pub async fn reset(&self) -> Result<bool, OrchestratorError> {
        self.send(DepositEvent::Reset).await
    }

    pub async fn retry(&self) -> Result<bool, OrchestratorError> {
        self.send(DepositEvent::Retry).await
    }

    pub fn view(&self) -> OrchestratorView {
        self.view_rx.borrow().clone()
    }

    /// Receiver that is notified on every view change.
    pub fn subscribe(&self) -> watch::Receiver<OrchestratorView> {
        self.view_rx.clone()
    }

    async fn send(&self, event: DepositEvent) -> Result<bool, OrchestratorError> {
        let (reply, reply_rx) = oneshot::channel();
        self.msg_tx
            .send(WorkerMsg::Command { event, reply })
            .map_err(|_| OrchestratorError::Closed)?;
        reply_rx.await.map_err(|_| OrchestratorError::Closed)
    }
}

/// Spawns the orchestrator as a critical task that stops on shutdown.
pub fn spawn_orchestrator<W: WorkerClient, S: KvStore>(
    executor: &TaskExecutor,
    config: OrchestratorConfig,
    worker: Arc<W>,
    store: DepositStore<S>,
    feeds: FeedChannel,
) -> OrchestratorHandle {
    let (handle, task) = build_orchestrator(config, worker, store, feeds);

    executor.spawn_critical_async_with_shutdown("deposit_orchestrator", |shutdown| async move {
        task.run(async move { shutdown.wait_for_shutdown().await })
            .await;
        Ok(())
    });

    handle
}
