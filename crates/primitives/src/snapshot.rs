use serde::{Deserialize, Serialize};

use crate::{
    bridge::{BridgeJobState, LastFinalizedJob},
    status::DepositProcessingStatus,
};

/// Point-in-time view of a deposit's progress through the bridge.
///
/// Snapshots are recomputed continuously and never persisted.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct DepositSnapshot {
    pub status: DepositProcessingStatus,

    /// Estimated seconds until the next status change, never negative.
    pub time_remaining_sec: u64,

    /// Seconds spent in the current bridge stage.
    pub elapsed_sec: u64,

    pub deposit_block_number: u64,

    pub stage_name: String,

    pub input_block_number: u64,

    pub output_block_number: u64,

    pub last_finalized_job: LastFinalizedJob,
}

impl DepositSnapshot {
    pub fn new(
        status: DepositProcessingStatus,
        time_remaining_sec: u64,
        deposit_block_number: u64,
        bridge: &BridgeJobState,
    ) -> Self {
        Self {
            status,
            time_remaining_sec,
            elapsed_sec: bridge.elapsed_sec,
            deposit_block_number,
            stage_name: bridge.stage_name.clone(),
            input_block_number: bridge.input_block_number,
            output_block_number: bridge.output_block_number,
            last_finalized_job: bridge.last_finalized_job,
        }
    }

    /// Advances the countdown by `secs` without re-deriving the status.
    pub fn advanced_by(&self, secs: u64) -> Self {
        Self {
            time_remaining_sec: self.time_remaining_sec.saturating_sub(secs),
            elapsed_sec: self.elapsed_sec.saturating_add(secs),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_saturates() {
        let bridge = BridgeJobState {
            stage_name: "EthProcessorProofRequest".into(),
            elapsed_sec: 10,
            input_block_number: 1,
            output_block_number: 2,
            last_finalized_job: LastFinalizedJob::Unknown,
        };
        let snap = DepositSnapshot::new(
            DepositProcessingStatus::WaitingForCurrentJobCompletion,
            3,
            2,
            &bridge,
        );

        let later = snap.advanced_by(5);
        assert_eq!(later.time_remaining_sec, 0);
        assert_eq!(later.elapsed_sec, 15);
        assert_eq!(later.status, snap.status);
    }
}
