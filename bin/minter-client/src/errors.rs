use std::io;

use format_serde_error::SerdeError;
use jsonrpsee::types::ErrorObjectOwned;
use minter_orchestrator::OrchestratorError;
use minter_primitives::errors::ParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum InitError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("config: {0}")]
    MalformedConfig(#[from] SerdeError),

    #[error("address: {0}")]
    MalformedAddress(#[from] ParseError),

    #[error("code verifier file is empty")]
    EmptyCodeVerifier,

    #[error("config: {0} must be non-zero")]
    ZeroInterval(&'static str),
}

#[derive(Debug, Error)]
pub(crate) enum RpcServerError {
    #[error("deposit number must be positive")]
    InvalidDepositNumber,

    #[error("orchestrator is not running")]
    OrchestratorClosed,

    #[error("system time may be inaccurate")]
    ClockSkew(i64),
}

impl RpcServerError {
    pub(crate) fn code(&self) -> i32 {
        match self {
            Self::InvalidDepositNumber => -32602,
            Self::OrchestratorClosed => -32001,
            Self::ClockSkew(_) => -32000,
        }
    }
}

impl From<OrchestratorError> for RpcServerError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::InvalidDepositNumber => Self::InvalidDepositNumber,
            OrchestratorError::Closed => Self::OrchestratorClosed,
        }
    }
}

impl From<RpcServerError> for ErrorObjectOwned {
    fn from(val: RpcServerError) -> Self {
        let code = val.code();
        let message = val.to_string();
        match val {
            RpcServerError::ClockSkew(diff) => ErrorObjectOwned::owned(code, message, Some(diff)),
            _ => ErrorObjectOwned::owned::<serde_json::Value>(code, message, None),
        }
    }
}
