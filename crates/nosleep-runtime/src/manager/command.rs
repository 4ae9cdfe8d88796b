//! Commands for the execution-state worker.
//!
//! Callers never touch the platform directly. They enqueue a [`Command`]
//! and wait on its reply slot; the worker applies commands one at a time
//! on its pinned thread.
//!
//! ```text
//! RPC task A ──┐
//!              │
//! RPC task B ──┼──► mpsc::Sender<Command> ──► worker (pinned OS thread)
//!              │                                   │
//! RPC task C ──┘                                   ▼
//!                                      set_thread_execution_state()
//! ```

use super::ManagerError;
use nosleep_types::ExecFlags;
use tokio::sync::oneshot;

/// Reply slot carried by a [`Command`].
pub(crate) type CommandReply = oneshot::Sender<Result<ExecFlags, ManagerError>>;

/// A single "set flags" request.
///
/// Created per call, consumed exactly once by the worker: either applied
/// (reply carries the previous flags or the platform error) or rejected
/// with [`ManagerError::Stopped`] when the worker is shutting down.
#[derive(Debug)]
pub(crate) struct Command {
    /// Flags to set, `CONTINUOUS` already included.
    pub(crate) flags: ExecFlags,
    /// Where the result goes.
    pub(crate) reply: CommandReply,
}

impl Command {
    /// Creates a command and the receiver for its result.
    ///
    /// `CONTINUOUS` is always OR'd in here so no caller can forget it.
    pub(crate) fn new(
        flags: ExecFlags,
    ) -> (Self, oneshot::Receiver<Result<ExecFlags, ManagerError>>) {
        let (reply, rx) = oneshot::channel();
        let cmd = Self {
            flags: flags | ExecFlags::CONTINUOUS,
            reply,
        };
        (cmd, rx)
    }

    /// Delivers the result. The caller may have gone away; that is fine.
    pub(crate) fn respond(self, result: Result<ExecFlags, ManagerError>) {
        let _ = self.reply.send(result);
    }
}
