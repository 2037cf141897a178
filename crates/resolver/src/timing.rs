//! Expected stage durations.

use minter_primitives::bridge::{BridgeStage, TimingsExtension};

/// Duration assumed for a stage nobody has a figure for.
pub const DEFAULT_STAGE_DURATION_SECS: u64 = 15;

/// Static table of expected bridge stage durations.
///
/// The table is authoritative for every stage it knows. The bridge's dynamic timings are only
/// consulted for stage names missing from the table, then [`DEFAULT_STAGE_DURATION_SECS`] applies.
#[derive(Clone, Debug, Default)]
pub struct TimingModel;

impl TimingModel {
    pub fn new() -> Self {
        Self
    }

    /// Expected duration of a known stage, in seconds.
    pub fn stage_duration(&self, stage: BridgeStage) -> u64 {
        match stage {
            BridgeStage::BridgeHeadJobCreated => 60,
            BridgeStage::BridgeHeadJobSucceeded => 1,
            BridgeStage::ProofConversionJobReceived => 240,
            BridgeStage::ProofConversionJobSucceeded => 1,
            BridgeStage::EthProcessorProofRequest => 90,
            BridgeStage::EthProcessorProofSucceeded => 1,
            BridgeStage::EthProcessorTransactionSubmitting => 30,
            BridgeStage::EthProcessorTransactionSubmitSucceeded => 180,
            BridgeStage::EthProcessorTransactionFinalizationSucceeded => 384,
        }
    }

    /// Expected duration of the stage with the given name, in seconds.
    pub fn expected_duration(&self, stage_name: &str, ext: &TimingsExtension) -> u64 {
        match stage_name.parse::<BridgeStage>() {
            Ok(stage) => self.stage_duration(stage),
            Err(_) => ext.get(stage_name).unwrap_or(DEFAULT_STAGE_DURATION_SECS),
        }
    }
}
