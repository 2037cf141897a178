use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("deposit number must be positive")]
    InvalidDepositNumber,

    #[error("orchestrator is not running")]
    Closed,
}
