//! Combine-latest state over the three feeds for a single deposit.

use minter_primitives::prelude::*;
use tracing::*;

use crate::{derive, errors::ResolverError, timing::TimingModel};

/// A single update from one of the feeds.
#[derive(Clone, Debug)]
pub enum FeedUpdate {
    EthFinality(EthFinalityState),
    BridgeState(BridgeJobState),
    BridgeTimings(TimingsExtension),
}

/// Keeps the last known value of every feed for one deposit and derives snapshots from them.
///
/// A status is only derived on feed updates, or on ticks while the deposit waits for source
/// chain finality. Any other tick just advances the countdown of the last derived snapshot.
/// Once a [`MissedMintingOpportunity`](DepositProcessingStatus::MissedMintingOpportunity)
/// snapshot was produced the tracker is terminated and produces nothing more.
#[derive(Debug)]
pub struct DepositTracker {
    deposit_block: u64,
    model: TimingModel,

    finality: Option<EthFinalityState>,
    bridge: Option<BridgeJobState>,
    timings: TimingsExtension,

    /// Snapshot as of the last derivation.
    base: Option<DepositSnapshot>,

    /// Ticks since the last feed update.
    ticks: u64,

    terminated: bool,
}

impl DepositTracker {
    pub fn new(deposit_block: u64) -> Result<Self, ResolverError> {
        Self::with_model(deposit_block, TimingModel::new())
    }

    pub fn with_model(deposit_block: u64, model: TimingModel) -> Result<Self, ResolverError> {
        if deposit_block == 0 {
            return Err(ResolverError::InvalidDepositBlock);
        }

        Ok(Self {
            deposit_block,
            model,
            finality: None,
            bridge: None,
            timings: TimingsExtension::default(),
            base: None,
            ticks: 0,
            terminated: false,
        })
    }

    pub fn deposit_block(&self) -> u64 {
        self.deposit_block
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// The latest snapshot with the countdown advanced by the ticks seen since it was derived.
    pub fn current(&self) -> Option<DepositSnapshot> {
        self.base.as_ref().map(|base| base.advanced_by(self.ticks))
    }

    /// Applies a feed update and re-derives the snapshot, if all required feeds have a value.
    pub fn apply(&mut self, update: FeedUpdate) -> Option<DepositSnapshot> {
        if self.terminated {
            return None;
        }

        match update {
            FeedUpdate::EthFinality(fin) => {
                if let Some(cur) = &self.finality {
                    let cur_pos = (cur.latest_finality_block_number, cur.latest_finality_slot);
                    let new_pos = (fin.latest_finality_block_number, fin.latest_finality_slot);
                    if new_pos < cur_pos {
                        warn!(?cur_pos, ?new_pos, "ignoring finality regression");
                        return None;
                    }
                }
                self.finality = Some(fin);
            }
            FeedUpdate::BridgeState(bridge) => self.bridge = Some(bridge),
            FeedUpdate::BridgeTimings(timings) => self.timings = timings,
        }

        self.ticks = 0;
        self.evaluate()
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> Option<DepositSnapshot> {
        if self.terminated {
            return None;
        }

        let waiting_for_finality = self.base.as_ref()?.status
            == DepositProcessingStatus::WaitingForEthFinality;
        self.ticks += 1;

        if waiting_for_finality {
            self.evaluate()
        } else {
            self.emit()
        }
    }

    fn evaluate(&mut self) -> Option<DepositSnapshot> {
        let (Some(finality), Some(bridge)) = (&self.finality, &self.bridge) else {
            return None;
        };

        let status = derive::derive_status(self.deposit_block, finality, bridge);
        let secs = derive::time_remaining(
            status,
            self.deposit_block,
            finality,
            bridge,
            &self.timings,
            &self.model,
        );

        if self.base.as_ref().map(|b| b.status) != Some(status) {
            debug!(deposit_block = %self.deposit_block, %status, "deposit status changed");
        }

        self.base = Some(DepositSnapshot::new(
            status,
            secs,
            self.deposit_block,
            bridge,
        ));
        self.emit()
    }

    fn emit(&mut self) -> Option<DepositSnapshot> {
        let snapshot = self.current()?;
        if snapshot.status.is_missed() {
            self.terminated = true;
        }
        Some(snapshot)
    }
}
