//! Spawning and supervision of the client's long running tasks.

mod manager;
mod pending_tasks;
mod shutdown;

pub use manager::{CriticalTaskError, TaskExecutor, TaskManager};
pub use shutdown::{ShutdownGuard, ShutdownSignal};
