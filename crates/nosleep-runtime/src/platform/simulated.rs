//! In-process emulation of the execution-state primitive.
//!
//! Used on targets without a native API and by tests. Emulates the
//! observable contract:
//!
//! - State is tracked per calling thread.
//! - A call with `CONTINUOUS` replaces the thread's persistent state; a
//!   call without it only "resets timers" and leaves the state alone.
//! - The return value is the thread's state before the call.
//! - `USER_PRESENT` mixed with any other flag fails and sets nothing.
//!
//! A platform built with [`SimulatedPlatform::recording`] also keeps every
//! call with the calling [`ThreadId`] so tests can assert that all calls
//! came from one thread. [`SimulatedPlatform::new`] keeps no history.

use super::{ExecutionStatePlatform, PlatformError};
use nosleep_types::ExecFlags;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::thread::ThreadId;

/// Error code reported for rejected flag combinations
/// (`ERROR_INVALID_PARAMETER` on Windows).
const INVALID_PARAMETER: i32 = 87;

/// A single recorded platform call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformCall {
    /// Thread that issued the call.
    pub thread: ThreadId,
    /// Flags requested.
    pub flags: ExecFlags,
    /// Whether the call succeeded.
    pub succeeded: bool,
}

#[derive(Debug, Default)]
struct SimState {
    per_thread: HashMap<ThreadId, ExecFlags>,
    calls: Vec<PlatformCall>,
    fail_next: Option<String>,
}

/// Emulated execution-state platform.
///
/// # Example
///
/// ```
/// use nosleep_runtime::platform::{ExecutionStatePlatform, SimulatedPlatform};
/// use nosleep_types::ExecFlags;
///
/// let platform = SimulatedPlatform::new();
/// let previous = platform.set_thread_execution_state(ExecFlags::SYSTEM).unwrap();
/// assert_eq!(previous, ExecFlags::UNKNOWN);
///
/// let previous = platform.set_thread_execution_state(ExecFlags::CLEAR).unwrap();
/// assert_eq!(previous, ExecFlags::SYSTEM);
/// ```
#[derive(Debug, Default)]
pub struct SimulatedPlatform {
    state: Mutex<SimState>,
    record_calls: bool,
}

impl SimulatedPlatform {
    /// Emulation without call history, for long-running servers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emulation that records every call for later inspection.
    #[must_use]
    pub fn recording() -> Self {
        Self {
            record_calls: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.record_calls
    }

    /// Makes the next call fail with `message`, regardless of its flags.
    pub fn fail_next_call(&self, message: impl Into<String>) {
        self.state.lock().fail_next = Some(message.into());
    }

    /// Returns every call made so far, oldest first. Empty unless
    /// recording.
    #[must_use]
    pub fn calls(&self) -> Vec<PlatformCall> {
        self.state.lock().calls.clone()
    }

    /// Returns the number of calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Returns the persistent state held for `thread`.
    #[must_use]
    pub fn state_of(&self, thread: ThreadId) -> ExecFlags {
        self.state
            .lock()
            .per_thread
            .get(&thread)
            .copied()
            .unwrap_or(ExecFlags::UNKNOWN)
    }

    /// Returns the distinct threads that have called into the platform.
    #[must_use]
    pub fn calling_threads(&self) -> Vec<ThreadId> {
        let state = self.state.lock();
        let mut threads: Vec<ThreadId> = Vec::new();
        for call in &state.calls {
            if !threads.contains(&call.thread) {
                threads.push(call.thread);
            }
        }
        threads
    }
}

impl ExecutionStatePlatform for SimulatedPlatform {
    fn set_thread_execution_state(&self, flags: ExecFlags) -> Result<ExecFlags, PlatformError> {
        let thread = std::thread::current().id();
        let mut state = self.state.lock();

        let failure = match state.fail_next.take() {
            Some(message) => Some(PlatformError::call_failed(flags, None, message)),
            None if !flags.is_supported() => Some(PlatformError::call_failed(
                flags,
                Some(INVALID_PARAMETER),
                "The parameter is incorrect.",
            )),
            None => None,
        };

        if self.record_calls {
            state.calls.push(PlatformCall {
                thread,
                flags,
                succeeded: failure.is_none(),
            });
        }

        if let Some(err) = failure {
            return Err(err);
        }

        let previous = state
            .per_thread
            .get(&thread)
            .copied()
            .unwrap_or(ExecFlags::UNKNOWN);
        if flags.contains(ExecFlags::CONTINUOUS) {
            state.per_thread.insert(thread, flags);
        }
        Ok(previous)
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}
