//! Pure transition logic of the deposit orchestrator.
//!
//! The machine never performs IO. Store writes come back as [`StoreAction`]s and worker calls are
//! started by the caller when it observes the state that needs them.

use std::mem;

use minter_db::PersistedDeposit;
use minter_primitives::prelude::*;
use tracing::*;

use crate::{
    context::OrchestratorContext,
    event::DepositEvent,
    state::DepositState,
};

/// Facts learned along the way that aren't tied to a single state.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Flags {
    pub is_storage_setup: bool,
    pub needs_to_fund_account: bool,
}

/// Write to the durable store requested by a transition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StoreAction {
    PersistDepositNumber(u64),
    PersistProof(EthDepositProof),
    PersistMintTx(MinaTransaction),
    ClearAll,
}

/// Result of an accepted event.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Outcome {
    /// Store writes to perform, in order.
    pub actions: Vec<StoreAction>,

    /// Set when the event was a reset. Anything started before it is stale.
    pub reset: bool,
}

enum Transition {
    Next(DepositState),
    Ignored(DepositState),
}

#[derive(Debug)]
pub struct DepositMachine {
    state: DepositState,
    flags: Flags,
}

impl Default for DepositMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl DepositMachine {
    pub fn new() -> Self {
        Self {
            state: DepositState::Hydrating,
            flags: Flags::default(),
        }
    }

    pub fn state(&self) -> &DepositState {
        &self.state
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn context(&self) -> OrchestratorContext {
        OrchestratorContext {
            active_deposit_number: self.state.deposit_number(),
            computed_eth_proof: self.state.proof().cloned(),
            deposit_mint_tx: self.state.mint_tx().cloned(),
            is_storage_setup: self.flags.is_storage_setup,
            needs_to_fund_account: self.flags.needs_to_fund_account,
            error_message: self.state.error_message().map(str::to_owned),
        }
    }

    /// Feeds an event to the machine. Returns `None` if the current state doesn't accept it, in
    /// which case nothing changed.
    pub fn handle(&mut self, event: DepositEvent) -> Option<Outcome> {
        // Accepted everywhere, and wipes everything.
        if let DepositEvent::Reset = event {
            self.state = DepositState::Checking;
            self.flags = Flags::default();
            return Some(Outcome {
                actions: vec![StoreAction::ClearAll],
                reset: true,
            });
        }

        let mut actions = Vec::new();
        let state = mem::replace(&mut self.state, DepositState::Hydrating);
        match transition(state, event, &mut self.flags, &mut actions) {
            Transition::Next(next) => {
                self.state = settle(next, self.flags);
                Some(Outcome {
                    actions,
                    reset: false,
                })
            }
            Transition::Ignored(state) => {
                self.state = state;
                None
            }
        }
    }
}

fn transition(
    state: DepositState,
    event: DepositEvent,
    flags: &mut Flags,
    actions: &mut Vec<StoreAction>,
) -> Transition {
    use DepositEvent as E;
    use DepositState as S;
    use Transition::*;

    match (state, event) {
        (S::Hydrating, E::WorkerReady) => Next(S::Checking),

        (S::Checking, E::StoreLoaded(stored)) => Next(rehydrate(stored)),

        (S::NoActiveDepositNumber, E::SetDepositNumber(deposit_number)) if deposit_number > 0 => {
            actions.push(StoreAction::PersistDepositNumber(deposit_number));
            Next(S::HasActiveDepositNumber { deposit_number })
        }

        (S::CheckingStorageSetup { deposit_number }, E::StorageChecked { needs_setup }) => {
            flags.is_storage_setup = !needs_setup;
            Next(S::StorageSetupDecision {
                deposit_number,
                needs_setup,
            })
        }

        (S::SettingUpStorage { deposit_number }, E::StorageSetUp) => {
            flags.is_storage_setup = true;
            Next(S::MonitoringDepositStatus { deposit_number })
        }

        (S::MonitoringDepositStatus { deposit_number }, E::StatusChanged(snapshot))
            if snapshot.deposit_block_number == deposit_number =>
        {
            if snapshot.status.is_missed() {
                Next(S::MissedOpportunity {
                    deposit_number,
                    proof: None,
                })
            } else if snapshot.status.can_compute_eth_proof() {
                Next(S::ComputingEthProof { deposit_number })
            } else {
                Ignored(S::MonitoringDepositStatus { deposit_number })
            }
        }

        (S::ComputingEthProof { deposit_number }, E::EthProofComputed(proof)) => {
            actions.push(StoreAction::PersistProof(proof.clone()));
            Next(S::HasComputedEthProof {
                deposit_number,
                proof,
            })
        }

        (
            S::HasComputedEthProof {
                deposit_number,
                proof,
            },
            E::StatusChanged(snapshot),
        ) if snapshot.deposit_block_number == deposit_number => {
            if snapshot.status.is_missed() {
                Next(S::MissedOpportunity {
                    deposit_number,
                    proof: Some(proof),
                })
            } else if snapshot.status.can_mint() {
                Next(S::BuildingMintTx {
                    deposit_number,
                    proof,
                })
            } else {
                Ignored(S::HasComputedEthProof {
                    deposit_number,
                    proof,
                })
            }
        }

        (
            S::BuildingMintTx {
                deposit_number,
                proof,
            },
            E::MintTxBuilt {
                mint_tx,
                needs_to_fund_account,
            },
        ) => {
            flags.needs_to_fund_account = needs_to_fund_account;
            actions.push(StoreAction::PersistMintTx(mint_tx.clone()));
            Next(S::SubmittingMintTx {
                deposit_number: Some(deposit_number),
                proof: Some(proof),
                mint_tx,
            })
        }

        (
            S::HasDepositMintTx {
                deposit_number,
                proof,
                mint_tx,
            },
            E::SubmitMintTx,
        ) => Next(S::SubmittingMintTx {
            deposit_number,
            proof,
            mint_tx,
        }),

        (S::SubmittingMintTx { .. }, E::MintTxSubmitted(tx_hash)) => {
            Next(S::Completed { tx_hash })
        }

        (
            S::Error {
                failed_step,
                deposit_number: Some(deposit_number),
                ..
            },
            E::Retry,
        ) if failed_step.is_retryable() => Next(S::ComputingEthProof { deposit_number }),

        (state, E::StepFailed { step, .. }) if !matches!(state, S::Error { .. }) => {
            Next(S::Error {
                message: step.error_message().to_string(),
                failed_step: step,
                deposit_number: state.deposit_number(),
                proof: state.proof().cloned(),
                mint_tx: state.mint_tx().cloned(),
            })
        }

        (state, _) => Ignored(state),
    }
}

/// Picks the state to resume from, given what was found in the store.
fn rehydrate(stored: PersistedDeposit) -> DepositState {
    match stored {
        PersistedDeposit {
            active_deposit_number: Some(deposit_number),
            computed_eth_proof: Some(proof),
            ..
        } => DepositState::HasComputedEthProof {
            deposit_number,
            proof,
        },
        PersistedDeposit {
            active_deposit_number,
            computed_eth_proof,
            deposit_mint_tx: Some(mint_tx),
        } => DepositState::HasDepositMintTx {
            deposit_number: active_deposit_number,
            proof: computed_eth_proof,
            mint_tx,
        },
        PersistedDeposit {
            active_deposit_number: Some(deposit_number),
            ..
        } => DepositState::HasActiveDepositNumber { deposit_number },
        _ => DepositState::NoActiveDepositNumber,
    }
}

/// Follows the transitions that don't wait for any event.
fn settle(mut state: DepositState, flags: Flags) -> DepositState {
    loop {
        let next = match state {
            DepositState::HasActiveDepositNumber { deposit_number } if flags.is_storage_setup => {
                DepositState::MonitoringDepositStatus { deposit_number }
            }
            DepositState::HasActiveDepositNumber { deposit_number } => {
                DepositState::CheckingStorageSetup { deposit_number }
            }
            DepositState::StorageSetupDecision {
                deposit_number,
                needs_setup: true,
            } => DepositState::SettingUpStorage { deposit_number },
            DepositState::StorageSetupDecision {
                deposit_number,
                needs_setup: false,
            } => DepositState::MonitoringDepositStatus { deposit_number },
            state => return state,
        };

        trace!(%next, "passing through");
        state = next;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::WorkflowStep;

    fn snapshot(deposit_block: u64, status: DepositProcessingStatus) -> DepositSnapshot {
        let bridge = BridgeJobState {
            stage_name: BridgeStage::EthProcessorProofRequest.to_string(),
            elapsed_sec: 0,
            input_block_number: 450,
            output_block_number: 550,
            last_finalized_job: LastFinalizedJob::Unknown,
        };
        DepositSnapshot::new(status, 10, deposit_block, &bridge)
    }

    fn proof() -> EthDepositProof {
        EthDepositProof::new(json!({ "proof": "0x01" }))
    }

    fn loaded(stored: PersistedDeposit) -> DepositMachine {
        let mut machine = DepositMachine::new();
        machine.handle(DepositEvent::WorkerReady).unwrap();
        assert_eq!(machine.state(), &DepositState::Checking);
        machine.handle(DepositEvent::StoreLoaded(stored)).unwrap();
        machine
    }

    #[test]
    fn test_rehydration_priority() {
        let machine = loaded(PersistedDeposit::default());
        assert_eq!(machine.state(), &DepositState::NoActiveDepositNumber);

        let machine = loaded(PersistedDeposit {
            deposit_mint_tx: Some(MinaTransaction::new("tx")),
            ..Default::default()
        });
        assert_eq!(machine.state().name(), "hasDepositMintTx");

        let machine = loaded(PersistedDeposit {
            active_deposit_number: Some(500),
            computed_eth_proof: Some(proof()),
            deposit_mint_tx: Some(MinaTransaction::new("tx")),
        });
        assert_eq!(machine.state().name(), "hasComputedEthProof");

        // a number alone resumes monitoring, through the storage check
        let machine = loaded(PersistedDeposit {
            active_deposit_number: Some(500),
            ..Default::default()
        });
        assert_eq!(
            machine.state(),
            &DepositState::CheckingStorageSetup {
                deposit_number: 500
            }
        );

        // a proof without its deposit number can't be used
        let machine = loaded(PersistedDeposit {
            computed_eth_proof: Some(proof()),
            ..Default::default()
        });
        assert_eq!(machine.state(), &DepositState::NoActiveDepositNumber);
    }

    #[test]
    fn test_happy_path() {
        let mut machine = loaded(PersistedDeposit::default());

        assert!(machine.handle(DepositEvent::SetDepositNumber(0)).is_none());

        let out = machine.handle(DepositEvent::SetDepositNumber(500)).unwrap();
        assert_eq!(out.actions, vec![StoreAction::PersistDepositNumber(500)]);
        assert_eq!(machine.state().name(), "checkingStorageSetup");

        machine
            .handle(DepositEvent::StorageChecked { needs_setup: false })
            .unwrap();
        assert_eq!(
            machine.state(),
            &DepositState::MonitoringDepositStatus {
                deposit_number: 500
            }
        );
        assert!(machine.flags().is_storage_setup);

        // not eligible yet
        let waiting = snapshot(500, DepositProcessingStatus::WaitingForEthFinality);
        assert!(machine
            .handle(DepositEvent::StatusChanged(waiting))
            .is_none());

        // some other deposit
        let other = snapshot(501, DepositProcessingStatus::ReadyToMint);
        assert!(machine.handle(DepositEvent::StatusChanged(other)).is_none());

        let current = snapshot(500, DepositProcessingStatus::WaitingForCurrentJobCompletion);
        machine
            .handle(DepositEvent::StatusChanged(current.clone()))
            .unwrap();
        assert_eq!(machine.state().name(), "computingEthProof");

        let out = machine
            .handle(DepositEvent::EthProofComputed(proof()))
            .unwrap();
        assert_eq!(out.actions, vec![StoreAction::PersistProof(proof())]);

        // the proof is there but minting has to wait for finalization
        assert!(machine
            .handle(DepositEvent::StatusChanged(current))
            .is_none());

        let ready = snapshot(500, DepositProcessingStatus::ReadyToMint);
        machine.handle(DepositEvent::StatusChanged(ready)).unwrap();
        assert_eq!(machine.state().name(), "buildingMintTx");

        let tx = MinaTransaction::new("mint");
        let out = machine
            .handle(DepositEvent::MintTxBuilt {
                mint_tx: tx.clone(),
                needs_to_fund_account: true,
            })
            .unwrap();
        assert_eq!(out.actions, vec![StoreAction::PersistMintTx(tx.clone())]);

        let ctx = machine.context();
        assert_eq!(ctx.active_deposit_number, Some(500));
        assert_eq!(ctx.computed_eth_proof, Some(proof()));
        assert_eq!(ctx.deposit_mint_tx, Some(tx));
        assert!(ctx.needs_to_fund_account);

        machine
            .handle(DepositEvent::MintTxSubmitted(TxHash::new("5Jhash")))
            .unwrap();
        assert_eq!(
            machine.state(),
            &DepositState::Completed {
                tx_hash: TxHash::new("5Jhash")
            }
        );

        let out = machine.handle(DepositEvent::Reset).unwrap();
        assert!(out.reset);
        assert_eq!(out.actions, vec![StoreAction::ClearAll]);
        assert_eq!(machine.context(), OrchestratorContext::default());
    }

    #[test]
    fn test_storage_setup_branch() {
        let mut machine = loaded(PersistedDeposit::default());
        machine.handle(DepositEvent::SetDepositNumber(7)).unwrap();
        machine
            .handle(DepositEvent::StorageChecked { needs_setup: true })
            .unwrap();
        assert_eq!(machine.state().name(), "settingUpStorage");
        assert!(!machine.flags().is_storage_setup);

        machine.handle(DepositEvent::StorageSetUp).unwrap();
        assert_eq!(machine.state().name(), "monitoringDepositStatus");
        assert!(machine.flags().is_storage_setup);
    }

    #[test]
    fn test_missed_keeps_proof() {
        let mut machine = loaded(PersistedDeposit {
            active_deposit_number: Some(100),
            computed_eth_proof: Some(proof()),
            deposit_mint_tx: None,
        });

        let missed = snapshot(100, DepositProcessingStatus::MissedMintingOpportunity);
        let out = machine.handle(DepositEvent::StatusChanged(missed)).unwrap();
        assert!(out.actions.is_empty(), "missing a deposit doesn't touch the store");
        assert_eq!(
            machine.state(),
            &DepositState::MissedOpportunity {
                deposit_number: 100,
                proof: Some(proof()),
            }
        );

        // only a reset gets out of it
        assert!(machine.handle(DepositEvent::Retry).is_none());
        assert!(machine.handle(DepositEvent::Reset).is_some());
        assert_eq!(machine.state(), &DepositState::Checking);
    }

    #[test]
    fn test_failures_and_retry() {
        let mut machine = loaded(PersistedDeposit {
            active_deposit_number: Some(500),
            ..Default::default()
        });
        machine
            .handle(DepositEvent::StepFailed {
                step: WorkflowStep::CheckStorageSetup,
                reason: "connection refused".into(),
            })
            .unwrap();
        assert_eq!(
            machine.context().error_message.as_deref(),
            Some("Failed to check storage setup")
        );
        assert!(machine.handle(DepositEvent::Retry).is_none());

        // a second failure doesn't overwrite the first one
        assert!(machine
            .handle(DepositEvent::StepFailed {
                step: WorkflowStep::PersistState,
                reason: "disk full".into(),
            })
            .is_none());

        machine.handle(DepositEvent::Reset).unwrap();
        machine
            .handle(DepositEvent::StoreLoaded(PersistedDeposit {
                active_deposit_number: Some(500),
                ..Default::default()
            }))
            .unwrap();
        machine
            .handle(DepositEvent::StorageChecked { needs_setup: false })
            .unwrap();
        machine
            .handle(DepositEvent::StatusChanged(snapshot(
                500,
                DepositProcessingStatus::ReadyToMint,
            )))
            .unwrap();
        machine
            .handle(DepositEvent::StepFailed {
                step: WorkflowStep::ComputeEthProof,
                reason: "prover busy".into(),
            })
            .unwrap();
        assert_eq!(machine.state().deposit_number(), Some(500));

        machine.handle(DepositEvent::Retry).unwrap();
        assert_eq!(
            machine.state(),
            &DepositState::ComputingEthProof {
                deposit_number: 500
            }
        );
    }

    #[test]
    fn test_rehydrated_mint_tx_submit() {
        let mut machine = loaded(PersistedDeposit {
            deposit_mint_tx: Some(MinaTransaction::new("signed")),
            ..Default::default()
        });

        // nothing to monitor without a deposit number
        assert_eq!(machine.state().tracked_deposit(), None);
        assert!(machine.handle(DepositEvent::SetDepositNumber(3)).is_none());

        machine.handle(DepositEvent::SubmitMintTx).unwrap();
        assert_eq!(
            machine.state().mint_tx(),
            Some(&MinaTransaction::new("signed"))
        );
        assert_eq!(machine.state().name(), "submittingMintTx");
    }
}
