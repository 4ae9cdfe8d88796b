//! Control service errors.
//!
//! These are request-level failures: they travel back to the one caller
//! that triggered them and never affect other callers. A failed platform
//! call is *not* a service error; it is reported inside a successful reply
//! (see [`FlagsReply::detail`](super::FlagsReply::detail)).

use crate::manager::ManagerError;
use nosleep_types::ErrorCode;
use thiserror::Error;

/// Control service error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The state manager has not been started.
    #[error("state manager not started")]
    NotStarted,

    /// The state manager has been stopped.
    #[error("state manager stopped")]
    Stopped,

    /// Shutdown has already been requested.
    #[error("server is shutting down")]
    ShuttingDown,

    /// Unexpected manager failure (worker spawn or panic).
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ManagerError> for ServiceError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::NotStarted => Self::NotStarted,
            ManagerError::Stopped => Self::Stopped,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl ErrorCode for ServiceError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotStarted => "SERVICE_NOT_STARTED",
            Self::Stopped => "SERVICE_STOPPED",
            Self::ShuttingDown => "SERVICE_SHUTTING_DOWN",
            Self::Internal(_) => "SERVICE_INTERNAL",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}
