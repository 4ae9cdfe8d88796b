//! One-shot shutdown signal.
//!
//! A [`ShutdownSignal`] starts open and is fired exactly once. Every clone
//! observes the same state, so one signal can be handed to the state
//! manager's worker, the accept loop and each connection task.
//!
//! ```text
//! Shutdown RPC ──fire()──► ShutdownSignal ──wait()──► accept loop
//!                                         └─wait()──► connection tasks
//! ```
//!
//! Firing twice is a lifecycle bug and panics. Callers that can race
//! legitimately (concurrent `Shutdown` calls, Ctrl-C) use
//! [`try_fire`](ShutdownSignal::try_fire) and handle the `false` case.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug)]
struct Inner {
    fired: AtomicBool,
    tx: watch::Sender<bool>,
}

/// Cloneable one-shot signal.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                fired: AtomicBool::new(false),
                tx,
            }),
        }
    }

    /// Fires the signal.
    ///
    /// # Panics
    ///
    /// Panics if the signal was already fired.
    pub fn fire(&self) {
        assert!(self.try_fire(), "shutdown signal fired twice");
    }

    /// Fires the signal if it is still open.
    ///
    /// Returns `false` if another caller fired it first.
    pub fn try_fire(&self) -> bool {
        if self
            .inner
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        self.inner.tx.send_replace(true);
        true
    }

    /// Returns `true` once the signal has been fired.
    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.inner.fired.load(Ordering::Acquire)
    }

    /// Resolves once the signal has been fired.
    ///
    /// Returns immediately if it already was.
    pub async fn wait(&self) {
        let mut rx = self.inner.tx.subscribe();
        // The sender lives as long as `self`, so the only exit is `true`.
        let _ = rx.wait_for(|fired| *fired).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
