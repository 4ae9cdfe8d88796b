//! The execution-state worker.
//!
//! Runs on a dedicated OS thread for the manager's whole active life.
//! The thread drives a current-thread tokio runtime, so the `select!`
//! below never migrates: every platform call is made from the same
//! thread identity.
//!
//! # Loop
//!
//! ```text
//! ┌──────────────────────────── Running ───────────────────────────┐
//! │  select! (biased)                                              │
//! │    stop fired      ──► exit loop                                │
//! │    Some(command)   ──► platform call, record snapshot, reply    │
//! │    None (senders)  ──► exit loop                                │
//! └────────────────────────────────────────────────────────────────┘
//!            │
//!            ▼
//!  reject queued commands (Stopped) ──► final CONTINUOUS-only call
//! ```

use super::command::Command;
use super::ManagerError;
use crate::platform::SharedPlatform;
use crate::signal::ShutdownSignal;
use nosleep_types::ExecFlags;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub(super) struct ExecStateWorker {
    platform: SharedPlatform,
    snapshot: Arc<AtomicU32>,
    commands: mpsc::Receiver<Command>,
    stop: ShutdownSignal,
}

impl ExecStateWorker {
    pub(super) fn new(
        platform: SharedPlatform,
        snapshot: Arc<AtomicU32>,
        commands: mpsc::Receiver<Command>,
        stop: ShutdownSignal,
    ) -> Self {
        Self {
            platform,
            snapshot,
            commands,
            stop,
        }
    }

    /// Thread entry point. Blocks until the worker exits.
    pub(super) fn run_on(self, runtime: Runtime) {
        runtime.block_on(self.run());
    }

    async fn run(mut self) {
        info!(
            thread = ?std::thread::current().id(),
            platform = self.platform.name(),
            "Execution-state worker started"
        );

        loop {
            tokio::select! {
                biased;

                () = self.stop.wait() => {
                    debug!("Execution-state worker received stop");
                    break;
                }

                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.apply(cmd),
                    None => {
                        debug!("Execution-state command queue closed");
                        break;
                    }
                },
            }
        }

        self.reject_pending();
        self.clear_on_exit();

        info!("Execution-state worker stopped");
    }

    fn apply(&self, cmd: Command) {
        let requested = cmd.flags;
        let result = match self.platform.set_thread_execution_state(requested) {
            Ok(previous) => {
                self.snapshot.store(requested.bits(), Ordering::Release);
                debug!(%requested, %previous, "Execution state set");
                Ok(previous)
            }
            Err(e) => {
                warn!(%requested, error = %e, "SetThreadExecutionState error");
                self.snapshot.store(ExecFlags::UNKNOWN.bits(), Ordering::Release);
                Err(ManagerError::Platform(e))
            }
        };
        cmd.respond(result);
    }

    /// Closes the queue and fails everything still in it.
    ///
    /// A sender racing the close either lands in the queue (and is
    /// rejected here) or sees the closed queue; when the receiver drops,
    /// any straggler's reply slot is dropped too. Nobody waits forever.
    fn reject_pending(&mut self) {
        self.commands.close();
        let mut rejected = 0usize;
        while let Ok(cmd) = self.commands.try_recv() {
            cmd.respond(Err(ManagerError::Stopped));
            rejected += 1;
        }
        if rejected > 0 {
            debug!(rejected, "Rejected queued commands on stop");
        }
    }

    fn clear_on_exit(&self) {
        match self.platform.set_thread_execution_state(ExecFlags::CLEAR) {
            Ok(previous) => {
                self.snapshot.store(ExecFlags::CLEAR.bits(), Ordering::Release);
                if previous.holds_awake() {
                    info!(%previous, "Released execution-state hold");
                } else {
                    debug!(%previous, "Execution state cleared on stop");
                }
            }
            Err(e) => warn!(error = %e, "SetThreadExecutionState error during stop"),
        }
    }
}
