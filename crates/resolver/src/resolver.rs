//! Async driver feeding a [`DepositTracker`] from the feed channels.

use std::time::Duration;

use minter_primitives::prelude::*;
use minter_status::FeedChannel;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::*;

use crate::{
    config::ResolverConfig,
    errors::ResolverError,
    tracker::{DepositTracker, FeedUpdate},
};

/// Resolves the processing status of a single deposit for as long as it's alive.
///
/// The resolver runs as a background task which is aborted when the resolver is dropped, closing
/// every outstanding [`SnapshotSubscription`].
#[derive(Debug)]
pub struct DepositStatusResolver {
    deposit_block: u64,
    snapshot_rx: watch::Receiver<Option<DepositSnapshot>>,
    task: JoinHandle<()>,
}

impl DepositStatusResolver {
    /// Starts resolving the deposit at `deposit_block`. Must be called from within a tokio
    /// runtime.
    pub fn spawn(
        deposit_block: u64,
        feeds: &FeedChannel,
        config: &ResolverConfig,
    ) -> Result<Self, ResolverError> {
        if config.tick_interval.is_zero() {
            return Err(ResolverError::ZeroTickInterval);
        }
        let tracker = DepositTracker::new(deposit_block)?;
        let (snapshot_tx, snapshot_rx) = watch::channel(None);

        let inputs = FeedInputs {
            eth_finality: feeds.subscribe_eth_finality(),
            bridge_state: feeds.subscribe_bridge_state(),
            bridge_timings: feeds.subscribe_bridge_timings(),
        };
        let task = tokio::spawn(resolver_task(
            tracker,
            inputs,
            config.tick_interval,
            snapshot_tx,
        ));

        debug!(%deposit_block, "started deposit status resolver");
        Ok(Self {
            deposit_block,
            snapshot_rx,
            task,
        })
    }

    pub fn deposit_block(&self) -> u64 {
        self.deposit_block
    }

    /// The most recent snapshot, if enough feed data arrived to derive one.
    pub fn latest(&self) -> Option<DepositSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribes to snapshots. The latest snapshot, if any, is replayed first.
    pub fn subscribe(&self) -> SnapshotSubscription {
        let mut rx = self.snapshot_rx.clone();
        rx.mark_changed();
        SnapshotSubscription { rx, done: false }
    }
}

impl Drop for DepositStatusResolver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Stream of snapshots from a [`DepositStatusResolver`].
///
/// Intermediate snapshots may be skipped by a slow consumer, the latest one is never lost. The
/// subscription ends after a missed minting opportunity or when the resolver goes away.
#[derive(Debug)]
pub struct SnapshotSubscription {
    rx: watch::Receiver<Option<DepositSnapshot>>,
    done: bool,
}

impl SnapshotSubscription {
    /// Waits for the next snapshot. Returns `None` once the subscription ended.
    pub async fn next(&mut self) -> Option<DepositSnapshot> {
        while !self.done {
            if self.rx.changed().await.is_err() {
                self.done = true;
                break;
            }

            let Some(snapshot) = self.rx.borrow_and_update().clone() else {
                continue;
            };
            if snapshot.status.is_missed() {
                self.done = true;
            }
            return Some(snapshot);
        }

        None
    }
}

struct FeedInputs {
    eth_finality: watch::Receiver<Option<EthFinalityState>>,
    bridge_state: watch::Receiver<Option<BridgeJobState>>,
    bridge_timings: watch::Receiver<TimingsExtension>,
}

async fn resolver_task(
    mut tracker: DepositTracker,
    mut inputs: FeedInputs,
    tick_interval: Duration,
    snapshot_tx: watch::Sender<Option<DepositSnapshot>>,
) {
    let deposit_block = tracker.deposit_block();

    // Seed with whatever the feeds already hold.
    let initial = [
        Some(FeedUpdate::BridgeTimings(
            inputs.bridge_timings.borrow_and_update().clone(),
        )),
        (*inputs.eth_finality.borrow_and_update()).map(FeedUpdate::EthFinality),
        inputs
            .bridge_state
            .borrow_and_update()
            .clone()
            .map(FeedUpdate::BridgeState),
    ];
    for update in initial.into_iter().flatten() {
        if let Some(snapshot) = tracker.apply(update) {
            if publish(&snapshot_tx, snapshot) {
                return;
            }
        }
    }

    let mut ticker = time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        let update = tokio::select! {
            res = inputs.eth_finality.changed() => {
                if res.is_err() {
                    break;
                }
                let fin = *inputs.eth_finality.borrow_and_update();
                fin.map(FeedUpdate::EthFinality)
            }
            res = inputs.bridge_state.changed() => {
                if res.is_err() {
                    break;
                }
                let state = inputs.bridge_state.borrow_and_update().clone();
                state.map(FeedUpdate::BridgeState)
            }
            res = inputs.bridge_timings.changed() => {
                if res.is_err() {
                    break;
                }
                let timings = inputs.bridge_timings.borrow_and_update().clone();
                Some(FeedUpdate::BridgeTimings(timings))
            }
            _ = ticker.tick() => {
                if let Some(snapshot) = tracker.tick() {
                    if publish(&snapshot_tx, snapshot) {
                        break;
                    }
                }
                continue;
            }
        };

        let Some(update) = update else {
            continue;
        };

        // The countdown restarts from the fresh feed figures.
        ticker.reset();
        if let Some(snapshot) = tracker.apply(update) {
            if publish(&snapshot_tx, snapshot) {
                break;
            }
        }
    }

    debug!(%deposit_block, "deposit status resolver exiting");
}

/// Publishes a snapshot, returns whether the resolver is done.
fn publish(tx: &watch::Sender<Option<DepositSnapshot>>, snapshot: DepositSnapshot) -> bool {
    let missed = snapshot.status.is_missed();
    if missed {
        info!(deposit_block = %snapshot.deposit_block_number, "deposit missed its minting opportunity");
    }
    tx.send_replace(Some(snapshot));
    missed
}
