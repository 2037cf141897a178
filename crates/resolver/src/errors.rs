use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ResolverError {
    #[error("deposit block number must be positive")]
    InvalidDepositBlock,

    #[error("tick interval must be non-zero")]
    ZeroTickInterval,
}
