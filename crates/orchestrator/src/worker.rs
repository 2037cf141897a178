//! Async side of the orchestrator: runs the effects of the [`DepositMachine`] and feeds their
//! results back into it.

use std::{collections::VecDeque, fmt, future::Future, pin::pin, sync::Arc};

use minter_db::{DepositStore, KvStore};
use minter_primitives::prelude::*;
use minter_resolver::DepositStatusResolver;
use minter_status::FeedChannel;
use minter_worker_client::{WorkerClient, WorkerError, WorkerResult};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::*;

use crate::{
    config::OrchestratorConfig,
    context::OrchestratorView,
    event::DepositEvent,
    handle::OrchestratorHandle,
    machine::{DepositMachine, StoreAction},
    state::{DepositState, WorkflowStep},
};

#[derive(Debug)]
pub(crate) enum WorkerMsg {
    /// User command, answered with whether the current state accepted it.
    Command {
        event: DepositEvent,
        reply: oneshot::Sender<bool>,
    },

    StepResult {
        generation: u64,
        event: DepositEvent,
    },

    Snapshot {
        generation: u64,
        snapshot: DepositSnapshot,
    },

    /// The snapshot stream of a resolver ended without a missed minting opportunity.
    MonitorEnded { generation: u64, deposit_block: u64 },
}

/// Live status monitoring of the tracked deposit.
struct ResolverLink {
    resolver: DepositStatusResolver,
    forwarder: JoinHandle<()>,
}

impl Drop for ResolverLink {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

/// Creates the orchestrator task and the handle controlling it. The task does nothing until
/// [`OrchestratorTask::run`] is polled.
pub fn build_orchestrator<W: WorkerClient, S: KvStore>(
    config: OrchestratorConfig,
    worker: Arc<W>,
    store: DepositStore<S>,
    feeds: FeedChannel,
) -> (OrchestratorHandle, OrchestratorTask<W, S>) {
    let (msg_tx, msg_rx) = mpsc::unbounded_channel();
    let (view_tx, view_rx) = watch::channel(OrchestratorView::default());

    let handle = OrchestratorHandle::new(msg_tx.clone(), view_rx);
    let task = OrchestratorTask {
        config: Arc::new(config),
        worker,
        store,
        feeds,
        machine: DepositMachine::new(),
        generation: 0,
        msg_tx,
        msg_rx,
        view_tx,
        step: None,
        resolver: None,
        snapshot: None,
        queue: VecDeque::new(),
    };

    (handle, task)
}

pub struct OrchestratorTask<W, S> {
    config: Arc<OrchestratorConfig>,
    worker: Arc<W>,
    store: DepositStore<S>,
    feeds: FeedChannel,
    machine: DepositMachine,

    /// Bumped on every reset. Step results and snapshots tagged with an older generation are
    /// dropped.
    generation: u64,

    msg_tx: mpsc::UnboundedSender<WorkerMsg>,
    msg_rx: mpsc::UnboundedReceiver<WorkerMsg>,
    view_tx: watch::Sender<OrchestratorView>,

    /// The workflow step in flight, at most one at a time.
    step: Option<JoinHandle<()>>,
    resolver: Option<ResolverLink>,

    /// Latest snapshot of the current deposit, kept after monitoring stops.
    snapshot: Option<DepositSnapshot>,

    /// Events raised while handling another one.
    queue: VecDeque<DepositEvent>,
}

impl<W, S> fmt::Debug for OrchestratorTask<W, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrchestratorTask")
            .field("state", self.machine.state())
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl<W: WorkerClient, S: KvStore> OrchestratorTask<W, S> {
    /// Runs the orchestrator until `shutdown` resolves.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) {
        let mut shutdown = pin!(shutdown);

        self.process(DepositEvent::WorkerReady);

        loop {
            let msg = tokio::select! {
                _ = shutdown.as_mut() => break,
                msg = self.msg_rx.recv() => match msg {
                    Some(msg) => msg,
                    None => break,
                },
            };
            self.handle_msg(msg);
        }

        self.abort_step();
        self.resolver = None;
        info!(state = %self.machine.state(), "deposit orchestrator exiting");
    }

    fn handle_msg(&mut self, msg: WorkerMsg) {
        match msg {
            WorkerMsg::Command { event, reply } => {
                let accepted = self.process(event);
                let _ = reply.send(accepted);
            }

            WorkerMsg::StepResult { generation, event } => {
                if generation != self.generation {
                    warn!(%generation, current = %self.generation, event = event.name(), "discarding stale step result");
                    return;
                }
                self.step = None;
                self.process(event);
            }

            WorkerMsg::Snapshot {
                generation,
                snapshot,
            } => {
                if generation != self.generation {
                    warn!(%generation, current = %self.generation, "discarding stale deposit snapshot");
                    return;
                }
                if self.machine.state().tracked_deposit() != Some(snapshot.deposit_block_number) {
                    trace!(deposit_block = %snapshot.deposit_block_number, "snapshot for untracked deposit");
                    return;
                }
                self.snapshot = Some(snapshot.clone());
                self.process(DepositEvent::StatusChanged(snapshot));
            }

            WorkerMsg::MonitorEnded {
                generation,
                deposit_block,
            } => {
                let monitored = self.resolver.as_ref().map(|l| l.resolver.deposit_block());
                if generation != self.generation || monitored != Some(deposit_block) {
                    debug!(%generation, %deposit_block, "ignoring end of stopped monitoring");
                    return;
                }
                self.resolver = None;
                self.process(DepositEvent::StepFailed {
                    step: WorkflowStep::MonitorDeposit,
                    reason: "deposit status resolver stopped".to_string(),
                });
            }
        }
    }

    /// Handles an event and everything it raises. Returns whether the event itself was accepted.
    ///
    /// The view is published after every transition, so short lived states like `completed` are
    /// observable too.
    fn process(&mut self, event: DepositEvent) -> bool {
        self.queue.push_back(event);

        let mut accepted = None;
        while let Some(event) = self.queue.pop_front() {
            let res = self.apply(event);
            accepted.get_or_insert(res);
        }

        self.publish();
        accepted.unwrap_or(false)
    }

    fn apply(&mut self, event: DepositEvent) -> bool {
        let name = event.name();
        let is_snapshot = matches!(event, DepositEvent::StatusChanged(_));
        if let DepositEvent::StepFailed { step, reason } = &event {
            error!(?step, %reason, "workflow step failed");
        }

        let from = self.machine.state().name();
        let Some(outcome) = self.machine.handle(event) else {
            if is_snapshot {
                trace!(state = %from, "snapshot doesn't change the deposit state");
            } else {
                debug!(event = %name, state = %from, "ignoring event");
            }
            return false;
        };

        if outcome.reset {
            self.generation += 1;
            self.abort_step();
            self.resolver = None;
            self.snapshot = None;
            debug!(generation = %self.generation, "orchestrator reset");
        }

        for action in outcome.actions {
            if let Err(err) = self.apply_store_action(&action) {
                self.queue.push_back(DepositEvent::StepFailed {
                    step: WorkflowStep::PersistState,
                    reason: err.to_string(),
                });
                break;
            }
        }

        info!(event = %name, %from, to = %self.machine.state(), "deposit state transition");
        self.enter_state();
        self.publish();
        true
    }

    fn apply_store_action(&self, action: &StoreAction) -> minter_db::DbResult<()> {
        match action {
            StoreAction::PersistDepositNumber(deposit_number) => {
                self.store.persist_deposit_number(*deposit_number)
            }
            StoreAction::PersistProof(proof) => self.store.persist_proof(proof),
            StoreAction::PersistMintTx(tx) => self.store.persist_mint_tx(tx),
            StoreAction::ClearAll => self.store.clear(),
        }
    }

    /// Starts whatever the new state needs.
    fn enter_state(&mut self) {
        let state = self.machine.state().clone();
        let tracked = state.tracked_deposit();

        if let Some(link) = &self.resolver {
            if Some(link.resolver.deposit_block()) != tracked {
                debug!(deposit_block = %link.resolver.deposit_block(), "stopping deposit status monitoring");
                self.resolver = None;
            }
        }

        // Every accepted transition leaves the state the running step was started for.
        self.abort_step();

        match state {
            DepositState::Checking => {
                let event = match self.store.load() {
                    Ok(stored) => DepositEvent::StoreLoaded(stored),
                    Err(err) => DepositEvent::StepFailed {
                        step: WorkflowStep::LoadState,
                        reason: err.to_string(),
                    },
                };
                self.queue.push_back(event);
            }

            DepositState::CheckingStorageSetup { .. } => {
                self.spawn_step(WorkflowStep::CheckStorageSetup, |worker, config| async move {
                    let needs_setup = worker
                        .needs_to_setup_storage(&config.eth_address, &config.mina_address)
                        .await?;
                    Ok::<_, WorkerError>(DepositEvent::StorageChecked { needs_setup })
                });
            }

            DepositState::SettingUpStorage { .. } => {
                self.spawn_step(WorkflowStep::SetupStorage, |worker, config| async move {
                    let tx = worker.setup_storage(&config.mina_address).await?;
                    let tx_hash = worker.submit_transaction(&tx).await?;
                    info!(%tx_hash, "storage setup transaction submitted");
                    Ok::<_, WorkerError>(DepositEvent::StorageSetUp)
                });
            }

            DepositState::ComputingEthProof { deposit_number } => {
                self.spawn_step(
                    WorkflowStep::ComputeEthProof,
                    move |worker, config| async move {
                        let proof = worker
                            .compute_eth_deposit(&config.code_verifier, deposit_number)
                            .await?;
                        Ok::<_, WorkerError>(DepositEvent::EthProofComputed(proof))
                    },
                );
            }

            DepositState::BuildingMintTx { proof, .. } => {
                self.spawn_step(WorkflowStep::BuildMintTx, move |worker, config| async move {
                    let needs_to_fund_account = worker.needs_to_fund_account().await?;
                    let mint_tx = worker
                        .compute_mint_tx(&proof, &config.code_verifier, needs_to_fund_account)
                        .await?;
                    Ok::<_, WorkerError>(DepositEvent::MintTxBuilt {
                        mint_tx,
                        needs_to_fund_account,
                    })
                });
            }

            DepositState::SubmittingMintTx { mint_tx, .. } => {
                self.spawn_step(WorkflowStep::SubmitMintTx, move |worker, _| async move {
                    let tx_hash = worker.submit_transaction(&mint_tx).await?;
                    Ok::<_, WorkerError>(DepositEvent::MintTxSubmitted(tx_hash))
                });
            }

            DepositState::Completed { tx_hash } => {
                info!(%tx_hash, "deposit minted");
                self.queue.push_back(DepositEvent::Reset);
            }

            _ => {}
        }

        if let Some(deposit_number) = tracked {
            if self.resolver.is_none() {
                self.start_monitoring(deposit_number);
            }
        }

        // A snapshot that arrived during the previous step may already make the new state
        // eligible.
        if self.machine.state().is_monitoring() {
            if let Some(snapshot) = self.snapshot.clone() {
                self.queue.push_back(DepositEvent::StatusChanged(snapshot));
            }
        }
    }

    fn spawn_step<F, Fut>(&mut self, step: WorkflowStep, make_step: F)
    where
        F: FnOnce(Arc<W>, Arc<OrchestratorConfig>) -> Fut,
        Fut: Future<Output = WorkerResult<DepositEvent>> + Send + 'static,
    {
        let fut = make_step(self.worker.clone(), self.config.clone());
        let msg_tx = self.msg_tx.clone();
        let generation = self.generation;

        debug!(?step, %generation, "starting workflow step");
        self.step = Some(tokio::spawn(async move {
            let event = match fut.await {
                Ok(event) => event,
                Err(err) => DepositEvent::StepFailed {
                    step,
                    reason: err.to_string(),
                },
            };
            let _ = msg_tx.send(WorkerMsg::StepResult { generation, event });
        }));
    }

    fn abort_step(&mut self) {
        if let Some(step) = self.step.take() {
            step.abort();
        }
    }

    fn start_monitoring(&mut self, deposit_number: u64) {
        let resolver =
            match DepositStatusResolver::spawn(deposit_number, &self.feeds, &self.config.resolver)
            {
                Ok(resolver) => resolver,
                Err(err) => {
                    self.queue.push_back(DepositEvent::StepFailed {
                        step: WorkflowStep::MonitorDeposit,
                        reason: err.to_string(),
                    });
                    return;
                }
            };

        // The new resolver replays its own latest snapshot.
        self.snapshot = None;
        let mut sub = resolver.subscribe();
        let msg_tx = self.msg_tx.clone();
        let generation = self.generation;
        let forwarder = tokio::spawn(async move {
            let mut missed = false;
            while let Some(snapshot) = sub.next().await {
                missed = snapshot.status.is_missed();
                if msg_tx
                    .send(WorkerMsg::Snapshot {
                        generation,
                        snapshot,
                    })
                    .is_err()
                {
                    return;
                }
            }

            if !missed {
                let _ = msg_tx.send(WorkerMsg::MonitorEnded {
                    generation,
                    deposit_block: deposit_number,
                });
            }
        });

        debug!(%deposit_number, "monitoring deposit status");
        self.resolver = Some(ResolverLink {
            resolver,
            forwarder,
        });
    }

    fn publish(&self) {
        let view = OrchestratorView {
            state: self.machine.state().clone(),
            context: self.machine.context(),
            snapshot: self.snapshot.clone(),
        };

        self.view_tx.send_if_modified(|cur| {
            if *cur == view {
                return false;
            }
            *cur = view;
            true
        });
    }
}
