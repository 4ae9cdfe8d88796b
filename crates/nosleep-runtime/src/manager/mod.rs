//! State manager: serialized ownership of the execution-state flags.
//!
//! The platform primitive's effect is tied to the identity of the calling
//! thread, so [`StateManager`] pins one OS thread for its whole active life
//! and funnels every mutation through a single-consumer command queue.
//! That queue is also the mutual-exclusion point: no two platform calls
//! ever overlap.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──start()──► Running ──stop()──► Stopped (terminal)
//! ```
//!
//! - [`start`](StateManager::start) spawns the worker. A second call panics.
//! - [`set_flags`](StateManager::set_flags) queues a command and waits for
//!   the worker's reply.
//! - [`get_flags`](StateManager::get_flags) reads the last recorded snapshot
//!   without touching the queue.
//! - [`stop`](StateManager::stop) rejects queued commands, issues a final
//!   `CONTINUOUS`-only call and joins the worker.
//!
//! # Snapshot
//!
//! The platform offers no query primitive. The snapshot is the flags last
//! *requested* successfully, or [`ExecFlags::UNKNOWN`] after a failed call.
//! It is an approximation and may be stale while a command is in flight.
//!
//! # Example
//!
//! ```
//! use nosleep_runtime::manager::StateManager;
//! use nosleep_runtime::platform::SimulatedPlatform;
//! use nosleep_types::ExecFlags;
//! use std::sync::Arc;
//!
//! # tokio_test_block(async {
//! let manager = StateManager::new(Arc::new(SimulatedPlatform::new()));
//! manager.start().expect("worker starts");
//!
//! let previous = manager.set_flags(ExecFlags::SYSTEM_REQUIRED).await.expect("set");
//! assert_eq!(previous, ExecFlags::UNKNOWN);
//! assert_eq!(manager.get_flags(), ExecFlags::SYSTEM);
//!
//! manager.stop().expect("worker stops");
//! # });
//! # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

mod command;
mod error;
mod worker;

pub use error::ManagerError;

use crate::platform::SharedPlatform;
use crate::signal::ShutdownSignal;
use command::Command;
use nosleep_types::ExecFlags;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use tracing::{info, warn};
use worker::ExecStateWorker;

/// Name of the pinned worker thread.
pub const WORKER_THREAD_NAME: &str = "nosleep-exec-state";

/// Command queue depth. Callers beyond this wait for space.
const COMMAND_BUFFER_SIZE: usize = 64;

/// Observable lifecycle state of a [`StateManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Running,
    Stopped,
}

struct RunningWorker {
    commands: mpsc::Sender<Command>,
    stop: ShutdownSignal,
    thread: JoinHandle<()>,
}

enum Lifecycle {
    Created,
    Running(RunningWorker),
    Stopped,
}

/// Owner of the process's execution-state flags.
///
/// Share it as `Arc<StateManager>`; every method takes `&self`.
pub struct StateManager {
    platform: SharedPlatform,
    snapshot: Arc<AtomicU32>,
    lifecycle: Mutex<Lifecycle>,
}

impl StateManager {
    /// Creates a manager in the `Created` state.
    #[must_use]
    pub fn new(platform: SharedPlatform) -> Self {
        Self {
            platform,
            snapshot: Arc::new(AtomicU32::new(ExecFlags::UNKNOWN.bits())),
            lifecycle: Mutex::new(Lifecycle::Created),
        }
    }

    /// Spawns the pinned worker thread.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Spawn`] if the thread or its runtime cannot
    /// be created. The manager stays in `Created` in that case.
    ///
    /// # Panics
    ///
    /// Panics if called more than once. A second worker would own a
    /// different thread identity, which the platform does not tolerate.
    pub fn start(&self) -> Result<(), ManagerError> {
        let mut lifecycle = self.lifecycle.lock();
        assert!(
            matches!(*lifecycle, Lifecycle::Created),
            "StateManager::start called twice"
        );

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(ManagerError::Spawn)?;

        let (tx, rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
        let stop = ShutdownSignal::new();
        let worker = ExecStateWorker::new(
            Arc::clone(&self.platform),
            Arc::clone(&self.snapshot),
            rx,
            stop.clone(),
        );

        let thread = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.into())
            .spawn(move || worker.run_on(runtime))
            .map_err(ManagerError::Spawn)?;

        *lifecycle = Lifecycle::Running(RunningWorker {
            commands: tx,
            stop,
            thread,
        });
        info!(platform = self.platform.name(), "State manager started");
        Ok(())
    }

    /// Sets the execution-state flags and returns the flags in effect
    /// immediately before.
    ///
    /// `CONTINUOUS` is added automatically. The call waits until the worker
    /// has performed the platform call; there is no timeout.
    ///
    /// # Errors
    ///
    /// - [`ManagerError::NotStarted`] before `start`.
    /// - [`ManagerError::Stopped`] after `stop`, or if the worker shut down
    ///   while the command was queued.
    /// - [`ManagerError::Platform`] if the native call failed. The snapshot
    ///   becomes [`ExecFlags::UNKNOWN`]; the manager keeps running.
    pub async fn set_flags(&self, flags: ExecFlags) -> Result<ExecFlags, ManagerError> {
        let commands = self.command_sender()?;

        let (cmd, reply) = Command::new(flags);
        commands
            .send(cmd)
            .await
            .map_err(|_| ManagerError::Stopped)?;

        reply.await.map_err(|_| ManagerError::Stopped)?
    }

    fn command_sender(&self) -> Result<mpsc::Sender<Command>, ManagerError> {
        match &*self.lifecycle.lock() {
            Lifecycle::Created => Err(ManagerError::NotStarted),
            Lifecycle::Stopped => Err(ManagerError::Stopped),
            Lifecycle::Running(worker) => Ok(worker.commands.clone()),
        }
    }

    /// Returns the last recorded snapshot without touching the worker.
    #[must_use]
    pub fn get_flags(&self) -> ExecFlags {
        ExecFlags::from_bits_retain(self.snapshot.load(Ordering::Acquire))
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        match &*self.lifecycle.lock() {
            Lifecycle::Created => LifecycleState::Created,
            Lifecycle::Running(_) => LifecycleState::Running,
            Lifecycle::Stopped => LifecycleState::Stopped,
        }
    }

    /// Stops the worker.
    ///
    /// Queued commands are rejected, the flags are cleared with a final
    /// `CONTINUOUS`-only call (failure is logged, not returned), and the
    /// worker thread is joined.
    ///
    /// # Errors
    ///
    /// - [`ManagerError::NotStarted`] if the manager was never started.
    /// - [`ManagerError::Stopped`] if it was already stopped.
    /// - [`ManagerError::WorkerPanicked`] if the worker thread panicked.
    pub fn stop(&self) -> Result<(), ManagerError> {
        let worker = {
            let mut lifecycle = self.lifecycle.lock();
            match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
                Lifecycle::Running(worker) => worker,
                Lifecycle::Created => {
                    *lifecycle = Lifecycle::Created;
                    return Err(ManagerError::NotStarted);
                }
                Lifecycle::Stopped => return Err(ManagerError::Stopped),
            }
        };

        let RunningWorker {
            commands,
            stop,
            thread,
        } = worker;
        stop.fire();
        drop(commands);

        thread.join().map_err(|_| ManagerError::WorkerPanicked)?;
        info!("State manager stopped");
        Ok(())
    }
}

impl Drop for StateManager {
    fn drop(&mut self) {
        if self.state() == LifecycleState::Running {
            if let Err(e) = self.stop() {
                warn!(error = %e, "State manager stop on drop failed");
            }
        }
    }
}

impl std::fmt::Debug for StateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateManager")
            .field("platform", &self.platform.name())
            .field("state", &self.state())
            .field("snapshot", &self.get_flags())
            .finish()
    }
}
