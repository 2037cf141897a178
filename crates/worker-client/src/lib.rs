//! Client side of the proof and transaction worker.

pub mod errors;
pub mod rpc;
pub mod traits;

pub use errors::{WorkerError, WorkerResult};
pub use rpc::RpcWorkerClient;
pub use traits::WorkerClient;

#[cfg(feature = "mocks")]
pub use traits::MockWorkerClient;
