use std::{any::Any, future::Future, panic, pin::pin, sync::Arc, time::Duration};

use futures_util::{future::select, FutureExt};
use thiserror::Error;
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};
use tracing::*;

use crate::{
    pending_tasks::PendingTasks,
    shutdown::{Shutdown, ShutdownGuard, ShutdownSignal},
};

/// Reason a critical task brought the client down.
#[derive(Debug, Error)]
pub enum CriticalTaskError {
    #[error("critical task `{task_name}` panicked: `{}`", .reason.as_deref().unwrap_or("<unknown>"))]
    Panicked {
        task_name: String,
        reason: Option<String>,
    },

    #[error("critical task `{task_name}` failed: {reason}")]
    Failed { task_name: String, reason: String },
}

impl CriticalTaskError {
    fn panicked(task_name: &str, payload: Box<dyn Any + Send>) -> Self {
        let reason = match payload.downcast::<String>() {
            Ok(value) => Some(*value),
            Err(payload) => payload.downcast::<&str>().ok().map(|v| v.to_string()),
        };

        Self::Panicked {
            task_name: task_name.to_string(),
            reason,
        }
    }

    fn failed(task_name: &str, err: anyhow::Error) -> Self {
        Self::Failed {
            task_name: task_name.to_string(),
            reason: format!("{err:#}"),
        }
    }

    pub fn task_name(&self) -> &str {
        match self {
            Self::Panicked { task_name, .. } | Self::Failed { task_name, .. } => task_name,
        }
    }
}

/// Spawns and tracks long running tasks, watches for critical task failures and manages the
/// graceful shutdown on those and on external signals.
#[derive(Debug)]
pub struct TaskManager {
    tokio_handle: Handle,
    failed_tasks_tx: mpsc::UnboundedSender<CriticalTaskError>,
    failed_tasks_rx: mpsc::UnboundedReceiver<CriticalTaskError>,
    shutdown_signal: ShutdownSignal,
    pending_tasks: Arc<PendingTasks>,
}

impl TaskManager {
    pub fn new(tokio_handle: Handle) -> Self {
        let (failed_tasks_tx, failed_tasks_rx) = mpsc::unbounded_channel();

        Self {
            tokio_handle,
            failed_tasks_tx,
            failed_tasks_rx,
            shutdown_signal: ShutdownSignal::new(),
            pending_tasks: Arc::new(PendingTasks::default()),
        }
    }

    pub fn executor(&self) -> TaskExecutor {
        TaskExecutor {
            tokio_handle: self.tokio_handle.clone(),
            failed_tasks_tx: self.failed_tasks_tx.clone(),
            shutdown_signal: self.shutdown_signal.clone(),
            pending_tasks: self.pending_tasks.clone(),
        }
    }

    /// Get shutdown signal trigger
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown_signal.clone()
    }

    /// Sends the shutdown signal on ctrl-c.
    pub fn start_signal_listeners(&self) {
        let shutdown_signal = self.shutdown_signal();

        self.tokio_handle.spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(%err, "failed to listen for ctrl-c");
                return;
            }

            warn!("got INT, initiating shutdown");
            shutdown_signal.send()
        });
    }

    /// Blocks until a critical task fails or the shutdown signal is sent, then shuts everything
    /// down. Returns the first critical task failure, if any.
    ///
    /// Must not be called from within the runtime.
    pub fn monitor(mut self, shutdown_timeout: Option<Duration>) -> Result<(), CriticalTaskError> {
        let res = self.wait_for_task_failure(self.shutdown_signal.subscribe());

        self.shutdown_signal.send();
        if !self.wait_for_graceful_shutdown(shutdown_timeout) {
            info!("shutdown timeout expired, forcing shutdown");
        }

        res
    }

    fn wait_for_task_failure(&mut self, shutdown: Shutdown) -> Result<(), CriticalTaskError> {
        self.tokio_handle.block_on(async {
            tokio::select! {
                msg = self.failed_tasks_rx.recv() => match msg {
                    Some(err) => Err(err),
                    None => Ok(()),
                },
                _ = shutdown.wait_for_shutdown() => Ok(()),
            }
        })
    }

    /// Waits until every [`ShutdownGuard`] is dropped. Returns false if that didn't happen
    /// within `timeout`.
    fn wait_for_graceful_shutdown(&self, timeout: Option<Duration>) -> bool {
        let pending = self.pending_tasks.clone().wait_for_zero();
        let done = self.tokio_handle.block_on(async move {
            match timeout {
                Some(timeout) => tokio::time::timeout(timeout, pending).await.is_ok(),
                None => {
                    pending.await;
                    true
                }
            }
        });

        if done {
            debug!("gracefully shut down");
        } else {
            debug!(pending = %self.pending_tasks.current(), "graceful shutdown timed out");
        }
        done
    }
}

/// A type that can spawn new tasks
#[derive(Debug, Clone)]
pub struct TaskExecutor {
    tokio_handle: Handle,
    failed_tasks_tx: mpsc::UnboundedSender<CriticalTaskError>,
    shutdown_signal: ShutdownSignal,
    pending_tasks: Arc<PendingTasks>,
}

impl TaskExecutor {
    /// Spawns a future that is simply dropped on shutdown.
    /// An error or a panic triggers shutdown.
    pub fn spawn_critical_async(
        &self,
        name: &'static str,
        fut: impl Future<Output = anyhow::Result<()>> + Send + 'static,
    ) -> JoinHandle<()> {
        let shutdown = self.shutdown_signal.subscribe();
        let task = self.supervise(name, fut);

        let task = async move {
            let task = pin!(task);
            let shutdown = pin!(shutdown.wait_for_shutdown());
            select(shutdown, task).await;
        };

        info!(%name, "starting critical task");
        self.tokio_handle.spawn(task)
    }

    /// Spawns a future that takes care of its own shutdown through the [`ShutdownGuard`].
    /// An error or a panic triggers shutdown.
    pub fn spawn_critical_async_with_shutdown<F>(
        &self,
        name: &'static str,
        async_func: impl FnOnce(ShutdownGuard) -> F,
    ) -> JoinHandle<()>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let guard = ShutdownGuard::new(
            self.shutdown_signal.subscribe(),
            self.pending_tasks.clone(),
        );
        let task = self.supervise(name, async_func(guard));

        info!(%name, "starting critical task");
        self.tokio_handle.spawn(task)
    }

    fn supervise(
        &self,
        name: &'static str,
        fut: impl Future<Output = anyhow::Result<()>> + Send + 'static,
    ) -> impl Future<Output = ()> + Send + 'static {
        let failed_tasks_tx = self.failed_tasks_tx.clone();

        panic::AssertUnwindSafe(fut)
            .catch_unwind()
            .map(move |res| {
                let err = match res {
                    Ok(Ok(())) => {
                        debug!(%name, "critical task exited");
                        return;
                    }
                    Ok(Err(err)) => CriticalTaskError::failed(name, err),
                    Err(payload) => CriticalTaskError::panicked(name, payload),
                };

                error!(%name, %err, "critical task failed");
                let _ = failed_tasks_tx.send(err);
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_panics<T>(f: impl FnOnce() -> T) -> T {
        // dont want to print stack trace for expected panics while running test
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(|_| {}));
        let res = f();
        panic::set_hook(original_hook);
        res
    }

    #[test]
    fn test_critical_panic() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let manager = TaskManager::new(runtime.handle().clone());
        let executor = manager.executor();

        let err = quiet_panics(|| {
            executor.spawn_critical_async("panictask", async {
                panic!("intentional panic");
            });

            manager
                .monitor(Some(Duration::from_secs(5)))
                .expect_err("should give error")
        });

        assert_eq!(err.task_name(), "panictask");
        assert!(matches!(
            err,
            CriticalTaskError::Panicked { reason: Some(ref r), .. } if r == "intentional panic"
        ));
    }

    #[test]
    fn test_critical_error() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let manager = TaskManager::new(runtime.handle().clone());
        let executor = manager.executor();

        executor.spawn_critical_async_with_shutdown("ok-task", |shutdown| async move {
            shutdown.wait_for_shutdown().await;
            Ok(())
        });
        executor.spawn_critical_async("failing", async { anyhow::bail!("no connection") });

        let err = manager
            .monitor(Some(Duration::from_secs(5)))
            .expect_err("should give error");

        assert_eq!(err.task_name(), "failing");
        assert!(err.to_string().contains("no connection"));
    }

    #[test]
    fn test_shutdown() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let manager = TaskManager::new(runtime.handle().clone());
        let executor = manager.executor();

        executor.spawn_critical_async("async-task", async {
            std::future::pending::<()>().await;
            Ok(())
        });

        executor.spawn_critical_async_with_shutdown("async-task-2", |shutdown| async move {
            loop {
                if shutdown.should_shutdown() {
                    break;
                }

                // doing something useful
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            Ok(())
        });

        let shutdown_sig = manager.shutdown_signal();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            shutdown_sig.send();
        });

        let res = manager.monitor(Some(Duration::from_secs(5)));
        assert!(res.is_ok(), "should exit successfully");
    }

    #[test]
    fn test_graceful_shutdown_times_out() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let manager = TaskManager::new(runtime.handle().clone());
        let executor = manager.executor();

        // ignores the shutdown signal and never drops its guard
        executor.spawn_critical_async_with_shutdown("stuck", |shutdown| async move {
            let _shutdown = shutdown;
            std::future::pending::<()>().await;
            Ok(())
        });

        manager.shutdown_signal().send();
        assert!(!manager.wait_for_graceful_shutdown(Some(Duration::from_millis(100))));
    }
}
