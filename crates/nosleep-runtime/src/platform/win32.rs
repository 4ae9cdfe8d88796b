//! `SetThreadExecutionState` from kernel32.

use super::{ExecutionStatePlatform, PlatformError};
use nosleep_types::ExecFlags;
use windows::Win32::Foundation::GetLastError;
use windows::Win32::System::Power::{SetThreadExecutionState, EXECUTION_STATE};

/// Native Windows adapter.
///
/// A zero return value is the documented failure signal; the thread's
/// last-error code is attached to the returned [`PlatformError`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Platform;

impl Win32Platform {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ExecutionStatePlatform for Win32Platform {
    fn set_thread_execution_state(&self, flags: ExecFlags) -> Result<ExecFlags, PlatformError> {
        // SAFETY: takes and returns a plain bitmask, no pointers cross the boundary.
        let previous = unsafe { SetThreadExecutionState(EXECUTION_STATE(flags.bits())) };
        if previous.0 != 0 {
            return Ok(ExecFlags::from_bits_retain(previous.0));
        }

        // SAFETY: reads the calling thread's last-error slot.
        let last = unsafe { GetLastError() };
        let err = windows::core::Error::from_hresult(last.to_hresult());
        Err(PlatformError::call_failed(
            flags,
            Some(err.code().0),
            err.to_string(),
        ))
    }

    fn name(&self) -> &'static str {
        "win32"
    }
}
