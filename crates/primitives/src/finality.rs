use serde::{Deserialize, Serialize};

/// Latest finalized point of the source chain.
///
/// Finality only moves forward, consumers may rely on `latest_finality_block_number` never
/// decreasing for a well-behaved feed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EthFinalityState {
    pub latest_finality_block_number: u64,
    pub latest_finality_slot: u64,
}

impl EthFinalityState {
    pub fn new(latest_finality_block_number: u64, latest_finality_slot: u64) -> Self {
        Self {
            latest_finality_block_number,
            latest_finality_slot,
        }
    }

    /// Whether the given block is finalized.
    pub fn covers(&self, block_number: u64) -> bool {
        self.latest_finality_block_number >= block_number
    }
}
