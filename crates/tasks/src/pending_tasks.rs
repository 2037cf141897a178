use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    task::{Context, Poll},
};

use futures_util::task::AtomicWaker;

/// Number of tasks holding a [`ShutdownGuard`](crate::ShutdownGuard).
#[derive(Debug, Default)]
pub(crate) struct PendingTasks {
    counter: AtomicUsize,
    waker: AtomicWaker,
}

impl PendingTasks {
    pub(crate) fn current(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }

    pub(crate) fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn decrement(&self) {
        let prev = self.counter.fetch_sub(1, Ordering::SeqCst);
        if prev == 1 {
            self.waker.wake();
        }
    }

    /// Resolves once no task is pending anymore.
    pub(crate) fn wait_for_zero(self: Arc<Self>) -> WaitForZero {
        WaitForZero {
            pending_tasks: self,
        }
    }
}

#[derive(Debug)]
pub(crate) struct WaitForZero {
    pending_tasks: Arc<PendingTasks>,
}

impl Future for WaitForZero {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.pending_tasks.current() == 0 {
            return Poll::Ready(());
        }

        self.pending_tasks.waker.register(cx.waker());

        // the last task may have finished before the waker got registered
        if self.pending_tasks.current() == 0 {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}
