//! Platform call adapter.
//!
//! The only code that touches the native "set thread execution state"
//! primitive. Everything above this layer goes through the
//! [`StateManager`](crate::manager::StateManager), which guarantees that
//! every call is issued from the same OS thread.
//!
//! # Implementations
//!
//! | Type | Target | Notes |
//! |------|--------|-------|
//! | [`Win32Platform`] | Windows | `SetThreadExecutionState` from kernel32 |
//! | [`SimulatedPlatform`] | any | In-process emulation, optionally records callers |
//!
//! [`default_platform`] picks the native adapter where one exists.

mod error;
mod simulated;
#[cfg(windows)]
mod win32;

pub use error::PlatformError;
pub use simulated::{PlatformCall, SimulatedPlatform};
#[cfg(windows)]
pub use win32::Win32Platform;

use nosleep_types::ExecFlags;
use std::sync::Arc;

/// The native "set execution state, return previous state" primitive.
///
/// The effect of a call is scoped to the calling thread. Implementations
/// must not add logic beyond marshaling the bitmask and translating a
/// platform failure into [`PlatformError`].
pub trait ExecutionStatePlatform: Send + Sync {
    /// Sets `flags` for the calling thread and returns the flags that were
    /// in effect before the call.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::CallFailed`] when the platform rejects the
    /// request (for example `USER_PRESENT` mixed with other flags).
    fn set_thread_execution_state(&self, flags: ExecFlags) -> Result<ExecFlags, PlatformError>;

    /// Short human-readable name used in log lines.
    fn name(&self) -> &'static str;
}

/// Shared handle to a platform adapter.
pub type SharedPlatform = Arc<dyn ExecutionStatePlatform>;

/// Returns the native adapter for this target.
///
/// Targets without an execution-state primitive get a
/// [`SimulatedPlatform`]; the hold is then tracked in-process only.
#[must_use]
pub fn default_platform() -> SharedPlatform {
    #[cfg(windows)]
    {
        Arc::new(Win32Platform::new())
    }
    #[cfg(not(windows))]
    {
        tracing::warn!("no native execution-state API on this platform, holds are simulated");
        Arc::new(fallback_platform())
    }
}

/// Emulation used as the production adapter off Windows. Keeps no call
/// history so a long-running server does not grow.
#[cfg_attr(windows, allow(dead_code))]
fn fallback_platform() -> SimulatedPlatform {
    SimulatedPlatform::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_platform_reports_name() {
        let platform = default_platform();
        assert!(!platform.name().is_empty());
    }

    #[cfg(not(windows))]
    #[test]
    fn default_platform_is_simulated_off_windows() {
        assert_eq!(default_platform().name(), "simulated");
    }

    #[test]
    fn fallback_platform_keeps_no_history() {
        let platform = fallback_platform();
        assert!(!platform.is_recording());

        platform
            .set_thread_execution_state(ExecFlags::SYSTEM)
            .expect("call succeeds");
        assert_eq!(platform.call_count(), 0);
    }
}
