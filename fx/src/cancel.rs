//! Cooperative cancellation for suspending rate operations.

use std::future::Future;

use tokio::sync::watch;

use crate::error::{FxError, FxResult};

/// Owner side of a cancellation pair. Dropping it without calling
/// [`CancellationHandle::cancel`] never cancels.
#[derive(Debug)]
pub struct CancellationHandle {
    tx: watch::Sender<bool>,
}

impl CancellationHandle {
    /// Signal cancellation to every clone of the paired signal.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Observer side, passed into engine operations.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    rx: Option<watch::Receiver<bool>>,
}

/// Create a linked handle and signal.
pub fn cancellation() -> (CancellationHandle, CancellationSignal) {
    let (tx, rx) = watch::channel(false);
    (CancellationHandle { tx }, CancellationSignal { rx: Some(rx) })
}

impl CancellationSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Resolve once cancellation is requested.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Handle dropped without cancelling.
                return std::future::pending().await;
            }
        }
    }

    /// Fail fast with [`FxError::Cancelled`] if already cancelled.
    pub fn check(&self) -> FxResult<()> {
        if self.is_cancelled() {
            Err(FxError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Run `work` until it completes or cancellation fires, whichever is first.
    pub async fn run<F, T>(&self, work: F) -> FxResult<T>
    where
        F: Future<Output = FxResult<T>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(FxError::Cancelled),
            result = work => result,
        }
    }
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::never()
    }
}
