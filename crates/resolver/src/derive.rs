//! Pure status and countdown derivation.

use minter_primitives::prelude::*;

use crate::timing::TimingModel;

/// Slots per source chain epoch. Finality advances one epoch at a time.
pub const SLOTS_PER_EPOCH: i128 = 32;

/// Source chain slot time.
pub const SECONDS_PER_SLOT: i128 = 12;

/// Length of one finality epoch in seconds. The countdown of a job that already finalized wraps
/// around this period.
// Heuristic: matches the epoch length, not validated against real bridge timings.
pub const CONFIRMATION_WINDOW_SECS: i128 = SLOTS_PER_EPOCH * SECONDS_PER_SLOT;

/// Derives the processing status of the deposit at `deposit_block` from the latest feed values.
pub fn derive_status(
    deposit_block: u64,
    finality: &EthFinalityState,
    bridge: &BridgeJobState,
) -> DepositProcessingStatus {
    use DepositProcessingStatus::*;

    if !finality.covers(deposit_block) {
        return WaitingForEthFinality;
    }

    let window = bridge.window();
    if window.contains(deposit_block) {
        let finalized = bridge
            .stage()
            .is_some_and(|stage| stage.is_finalization_succeeded());
        return if finalized {
            ReadyToMint
        } else {
            WaitingForCurrentJobCompletion
        };
    }

    if window.output_block_number < deposit_block {
        return WaitingForPreviousJobCompletion;
    }

    // The running job's window is already past the deposit, the only way left is the window of
    // the last finalized job, as long as the running job hasn't cemented a new one.
    match bridge.last_finalized_job {
        LastFinalizedJob::Unknown => MissedMintingOpportunity,
        LastFinalizedJob::Known(last)
            if last.contains(deposit_block) && is_before_tx_submitted(bridge) =>
        {
            ReadyToMint
        }
        LastFinalizedJob::Known(_) => MissedMintingOpportunity,
    }
}

/// Whether the running job hasn't reached the "transaction submitted" stage yet. Unknown stages
/// are assumed to be past it.
fn is_before_tx_submitted(bridge: &BridgeJobState) -> bool {
    bridge
        .stage()
        .is_some_and(|stage| stage < BridgeStage::EthProcessorTransactionSubmitSucceeded)
}

/// Estimated seconds until the deposit block is finalized on the source chain.
///
/// Finality moves in whole epochs, so the deposit's slot is projected from the current
/// slot/block offset and rounded up to the next epoch boundary.
pub fn finality_time_remaining(deposit_block: u64, finality: &EthFinalityState) -> u64 {
    let fin_block = finality.latest_finality_block_number as i128;
    let delta = finality.latest_finality_slot as i128 - fin_block;

    let projected_slot = deposit_block as i128 + delta;
    let rounded_slot = round_up_to_epoch(projected_slot);
    let blocks_remaining = rounded_slot - delta - fin_block;

    clamp_secs(blocks_remaining * SECONDS_PER_SLOT)
}

fn round_up_to_epoch(slot: i128) -> i128 {
    (slot + SLOTS_PER_EPOCH - 1).div_euclid(SLOTS_PER_EPOCH) * SLOTS_PER_EPOCH
}

/// Estimated seconds left in the bridge's current stage.
pub fn stage_time_remaining(
    bridge: &BridgeJobState,
    timings: &TimingsExtension,
    model: &TimingModel,
) -> u64 {
    let expected = model.expected_duration(&bridge.stage_name, timings) as i128;
    let remaining = expected - bridge.elapsed_sec as i128;

    let finalized = bridge
        .stage()
        .is_some_and(|stage| stage.is_finalization_succeeded());
    if finalized {
        return clamp_secs(remaining.rem_euclid(CONFIRMATION_WINDOW_SECS));
    }

    clamp_secs(remaining)
}

/// Countdown for a freshly derived `status`.
pub fn time_remaining(
    status: DepositProcessingStatus,
    deposit_block: u64,
    finality: &EthFinalityState,
    bridge: &BridgeJobState,
    timings: &TimingsExtension,
    model: &TimingModel,
) -> u64 {
    match status {
        DepositProcessingStatus::WaitingForEthFinality => {
            finality_time_remaining(deposit_block, finality)
        }
        _ => stage_time_remaining(bridge, timings, model),
    }
}

fn clamp_secs(secs: i128) -> u64 {
    secs.clamp(0, u64::MAX as i128) as u64
}
