use minter_db::PersistedDeposit;
use minter_primitives::prelude::*;

use crate::state::WorkflowStep;

/// Input to the deposit state machine.
#[derive(Clone, Debug)]
pub enum DepositEvent {
    // User commands.
    SetDepositNumber(u64),
    SubmitMintTx,
    Reset,
    Retry,

    // Raised by the orchestrator itself.
    WorkerReady,
    StoreLoaded(PersistedDeposit),
    StorageChecked { needs_setup: bool },
    StorageSetUp,
    StatusChanged(DepositSnapshot),
    EthProofComputed(EthDepositProof),
    MintTxBuilt {
        mint_tx: MinaTransaction,
        needs_to_fund_account: bool,
    },
    MintTxSubmitted(TxHash),
    StepFailed { step: WorkflowStep, reason: String },
}

impl DepositEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DepositEvent::SetDepositNumber(_) => "SET_DEPOSIT_NUMBER",
            DepositEvent::SubmitMintTx => "SUBMIT_MINT_TX",
            DepositEvent::Reset => "RESET",
            DepositEvent::Retry => "RETRY",
            DepositEvent::WorkerReady => "WORKER_READY",
            DepositEvent::StoreLoaded(_) => "STORE_LOADED",
            DepositEvent::StorageChecked { .. } => "STORAGE_CHECKED",
            DepositEvent::StorageSetUp => "STORAGE_SET_UP",
            DepositEvent::StatusChanged(_) => "STATUS_CHANGED",
            DepositEvent::EthProofComputed(_) => "ETH_PROOF_COMPUTED",
            DepositEvent::MintTxBuilt { .. } => "MINT_TX_BUILT",
            DepositEvent::MintTxSubmitted(_) => "MINT_TX_SUBMITTED",
            DepositEvent::StepFailed { .. } => "STEP_FAILED",
        }
    }
}
