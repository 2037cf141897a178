use std::sync::Arc;

use tokio::sync::watch;

use crate::pending_tasks::PendingTasks;

/// Trigger for a graceful shutdown of every task spawned through a
/// [`TaskManager`](crate::TaskManager).
#[derive(Debug, Clone)]
pub struct ShutdownSignal(Arc<watch::Sender<bool>>);

impl ShutdownSignal {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self(Arc::new(tx))
    }

    /// Send shutdown signal
    pub fn send(&self) {
        self.0.send_replace(true);
    }

    pub fn is_sent(&self) -> bool {
        *self.0.borrow()
    }

    pub(crate) fn subscribe(&self) -> Shutdown {
        Shutdown(self.0.subscribe())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    pub(crate) fn should_shutdown(&self) -> bool {
        *self.0.borrow()
    }

    pub(crate) async fn wait_for_shutdown(&self) {
        let mut rx = self.0.clone();
        // a dropped signal can never fire, treat it like a sent one
        let _ = rx.wait_for(|sent| *sent).await;
    }
}

/// Handed to tasks that take care of their own shutdown. Graceful shutdown waits until every
/// guard has been dropped.
#[derive(Debug)]
pub struct ShutdownGuard {
    shutdown: Shutdown,
    pending: Arc<PendingTasks>,
}

impl ShutdownGuard {
    pub(crate) fn new(shutdown: Shutdown, pending: Arc<PendingTasks>) -> Self {
        pending.increment();
        Self { shutdown, pending }
    }

    /// Check if shutdown signal has been sent
    pub fn should_shutdown(&self) -> bool {
        self.shutdown.should_shutdown()
    }

    /// Waits until shutdown signal is sent
    pub async fn wait_for_shutdown(&self) {
        self.shutdown.wait_for_shutdown().await
    }
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        self.pending.decrement();
    }
}
