//! Platform call errors.

use nosleep_types::{ErrorCode, ExecFlags};
use thiserror::Error;

/// Failure reported by the native execution-state primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The platform rejected the request.
    ///
    /// `code` is the OS error code when the platform exposes one.
    #[error("SetThreadExecutionState({flags}) failed: {message}")]
    CallFailed {
        flags: ExecFlags,
        code: Option<i32>,
        message: String,
    },
}

impl PlatformError {
    /// Creates a call-failed error.
    pub fn call_failed(flags: ExecFlags, code: Option<i32>, message: impl Into<String>) -> Self {
        Self::CallFailed {
            flags,
            code,
            message: message.into(),
        }
    }

    /// Returns the flags the failed call was requesting.
    #[must_use]
    pub fn flags(&self) -> ExecFlags {
        match self {
            Self::CallFailed { flags, .. } => *flags,
        }
    }
}

impl ErrorCode for PlatformError {
    fn code(&self) -> &'static str {
        match self {
            Self::CallFailed { .. } => "PLATFORM_CALL_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        true
    }
}
