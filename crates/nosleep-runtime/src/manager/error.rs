//! State manager errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`ManagerError::NotStarted`] | `MANAGER_NOT_STARTED` | No |
//! | [`ManagerError::Stopped`] | `MANAGER_STOPPED` | No |
//! | [`ManagerError::Platform`] | `MANAGER_PLATFORM_FAILED` | Yes |
//! | [`ManagerError::Spawn`] | `MANAGER_SPAWN_FAILED` | No |
//! | [`ManagerError::WorkerPanicked`] | `MANAGER_WORKER_PANICKED` | No |

use crate::platform::PlatformError;
use nosleep_types::ErrorCode;
use thiserror::Error;

/// State manager error.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Operation invoked before [`start`](super::StateManager::start).
    #[error("state manager not started")]
    NotStarted,

    /// Operation invoked after [`stop`](super::StateManager::stop), or
    /// rejected because the worker was shutting down.
    #[error("state manager stopped")]
    Stopped,

    /// The native call failed. The manager stays usable.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// The worker thread or its runtime could not be created.
    #[error("failed to start execution-state worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The worker thread panicked before exiting.
    #[error("execution-state worker panicked")]
    WorkerPanicked,
}

impl ErrorCode for ManagerError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotStarted => "MANAGER_NOT_STARTED",
            Self::Stopped => "MANAGER_STOPPED",
            Self::Platform(_) => "MANAGER_PLATFORM_FAILED",
            Self::Spawn(_) => "MANAGER_SPAWN_FAILED",
            Self::WorkerPanicked => "MANAGER_WORKER_PANICKED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Platform(_))
    }
}
