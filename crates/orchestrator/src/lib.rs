//! Persisted state machine driving a single deposit from its deposit number to a submitted mint
//! transaction.
//!
//! [`machine::DepositMachine`] holds the pure transition logic, [`worker::OrchestratorTask`]
//! executes the side effects (store writes, worker calls, status monitoring) and is controlled
//! through an [`OrchestratorHandle`].

pub mod config;
pub mod context;
pub mod errors;
pub mod event;
pub mod handle;
pub mod machine;
pub mod state;
pub mod worker;

pub use config::OrchestratorConfig;
pub use context::{OrchestratorContext, OrchestratorView};
pub use errors::OrchestratorError;
pub use handle::{spawn_orchestrator, OrchestratorHandle};
pub use state::{DepositState, WorkflowStep};
pub use worker::{build_orchestrator, OrchestratorTask};
