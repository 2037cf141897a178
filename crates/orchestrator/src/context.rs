use minter_primitives::prelude::*;
use serde::{Deserialize, Serialize};

use crate::state::DepositState;

/// Flat view of everything the orchestrator knows about the active deposit.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorContext {
    pub active_deposit_number: Option<u64>,
    pub computed_eth_proof: Option<EthDepositProof>,
    pub deposit_mint_tx: Option<MinaTransaction>,
    pub is_storage_setup: bool,
    pub needs_to_fund_account: bool,
    pub error_message: Option<String>,
}

/// What the orchestrator publishes to its observers after every change.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorView {
    pub state: DepositState,
    pub context: OrchestratorContext,

    /// Latest status of the monitored deposit, if any is being monitored.
    pub snapshot: Option<DepositSnapshot>,
}

impl Default for OrchestratorView {
    fn default() -> Self {
        Self {
            state: DepositState::Hydrating,
            context: OrchestratorContext::default(),
            snapshot: None,
        }
    }
}
