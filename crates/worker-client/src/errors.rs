use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    /// The worker could not be reached or returned an error.
    #[error("worker rpc: {0}")]
    Rpc(#[from] jsonrpsee::core::ClientError),

    #[error("{0}")]
    Other(String),
}
