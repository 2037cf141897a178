use std::fmt;

use minter_primitives::prelude::*;
use serde::{Deserialize, Serialize};

/// A side-effecting step of the mint workflow. Used to tell which step a failure came from.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowStep {
    LoadState,
    PersistState,
    CheckStorageSetup,
    SetupStorage,
    MonitorDeposit,
    ComputeEthProof,
    BuildMintTx,
    SubmitMintTx,
}

impl WorkflowStep {
    /// Message shown to the user when the step fails.
    pub fn error_message(&self) -> &'static str {
        match self {
            WorkflowStep::LoadState => "Failed to load persisted deposit state",
            WorkflowStep::PersistState => "Failed to persist deposit state",
            WorkflowStep::CheckStorageSetup => "Failed to check storage setup",
            WorkflowStep::SetupStorage => "Failed to set up storage",
            WorkflowStep::MonitorDeposit => "Failed to monitor deposit status",
            WorkflowStep::ComputeEthProof => "Failed to compute eth proof",
            WorkflowStep::BuildMintTx => "Failed to build mint transaction",
            WorkflowStep::SubmitMintTx => "Failed to submit mint transaction",
        }
    }

    /// Only the proof computation can be retried with the inputs it was started with, every
    /// later step needs a full reset.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WorkflowStep::ComputeEthProof)
    }
}

/// State of the deposit orchestrator. Every state only carries the data valid in it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DepositState {
    Hydrating,

    Checking,

    NoActiveDepositNumber,

    HasActiveDepositNumber {
        deposit_number: u64,
    },

    CheckingStorageSetup {
        deposit_number: u64,
    },

    StorageSetupDecision {
        deposit_number: u64,
        needs_setup: bool,
    },

    SettingUpStorage {
        deposit_number: u64,
    },

    MonitoringDepositStatus {
        deposit_number: u64,
    },

    ComputingEthProof {
        deposit_number: u64,
    },

    HasComputedEthProof {
        deposit_number: u64,
        proof: EthDepositProof,
    },

    BuildingMintTx {
        deposit_number: u64,
        proof: EthDepositProof,
    },

    /// A rehydrated mint transaction doesn't necessarily come with the inputs it was built from.
    HasDepositMintTx {
        deposit_number: Option<u64>,
        proof: Option<EthDepositProof>,
        mint_tx: MinaTransaction,
    },

    SubmittingMintTx {
        deposit_number: Option<u64>,
        proof: Option<EthDepositProof>,
        mint_tx: MinaTransaction,
    },

    Completed {
        tx_hash: TxHash,
    },

    /// The deposit can't be minted through the normal path anymore. Persisted state is kept
    /// until the user resets.
    MissedOpportunity {
        deposit_number: u64,
        proof: Option<EthDepositProof>,
    },

    Error {
        message: String,
        failed_step: WorkflowStep,
        deposit_number: Option<u64>,
        proof: Option<EthDepositProof>,
        mint_tx: Option<MinaTransaction>,
    },
}

impl DepositState {
    pub fn name(&self) -> &'static str {
        match self {
            DepositState::Hydrating => "hydrating",
            DepositState::Checking => "checking",
            DepositState::NoActiveDepositNumber => "noActiveDepositNumber",
            DepositState::HasActiveDepositNumber { .. } => "hasActiveDepositNumber",
            DepositState::CheckingStorageSetup { .. } => "checkingStorageSetup",
            DepositState::StorageSetupDecision { .. } => "storageSetupDecision",
            DepositState::SettingUpStorage { .. } => "settingUpStorage",
            DepositState::MonitoringDepositStatus { .. } => "monitoringDepositStatus",
            DepositState::ComputingEthProof { .. } => "computingEthProof",
            DepositState::HasComputedEthProof { .. } => "hasComputedEthProof",
            DepositState::BuildingMintTx { .. } => "buildingMintTx",
            DepositState::HasDepositMintTx { .. } => "hasDepositMintTx",
            DepositState::SubmittingMintTx { .. } => "submittingMintTx",
            DepositState::Completed { .. } => "completed",
            DepositState::MissedOpportunity { .. } => "missedOpportunity",
            DepositState::Error { .. } => "error",
        }
    }

    pub fn deposit_number(&self) -> Option<u64> {
        match self {
            DepositState::HasActiveDepositNumber { deposit_number }
            | DepositState::CheckingStorageSetup { deposit_number }
            | DepositState::StorageSetupDecision { deposit_number, .. }
            | DepositState::SettingUpStorage { deposit_number }
            | DepositState::MonitoringDepositStatus { deposit_number }
            | DepositState::ComputingEthProof { deposit_number }
            | DepositState::HasComputedEthProof { deposit_number, .. }
            | DepositState::BuildingMintTx { deposit_number, .. }
            | DepositState::MissedOpportunity { deposit_number, .. } => Some(*deposit_number),
            DepositState::HasDepositMintTx { deposit_number, .. }
            | DepositState::SubmittingMintTx { deposit_number, .. }
            | DepositState::Error { deposit_number, .. } => *deposit_number,
            _ => None,
        }
    }

    pub fn proof(&self) -> Option<&EthDepositProof> {
        match self {
            DepositState::HasComputedEthProof { proof, .. }
            | DepositState::BuildingMintTx { proof, .. } => Some(proof),
            DepositState::HasDepositMintTx { proof, .. }
            | DepositState::SubmittingMintTx { proof, .. }
            | DepositState::MissedOpportunity { proof, .. }
            | DepositState::Error { proof, .. } => proof.as_ref(),
            _ => None,
        }
    }

    pub fn mint_tx(&self) -> Option<&MinaTransaction> {
        match self {
            DepositState::HasDepositMintTx { mint_tx, .. }
            | DepositState::SubmittingMintTx { mint_tx, .. } => Some(mint_tx),
            DepositState::Error { mint_tx, .. } => mint_tx.as_ref(),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            DepositState::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Whether the state reacts to deposit status snapshots.
    pub fn is_monitoring(&self) -> bool {
        matches!(
            self,
            DepositState::MonitoringDepositStatus { .. } | DepositState::HasComputedEthProof { .. }
        )
    }

    /// Deposit whose status has to stay resolved while in this state, so no snapshot is lost
    /// between monitoring phases.
    pub fn tracked_deposit(&self) -> Option<u64> {
        match self {
            DepositState::MonitoringDepositStatus { deposit_number }
            | DepositState::ComputingEthProof { deposit_number }
            | DepositState::HasComputedEthProof { deposit_number, .. }
            | DepositState::BuildingMintTx { deposit_number, .. } => Some(*deposit_number),
            _ => None,
        }
    }
}

impl fmt::Display for DepositState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
