//! Control service: the remotely invokable surface.
//!
//! [`ControlService`] translates each [`Method`] into a fixed flag
//! combination for the [`StateManager`], or into a snapshot read, or into
//! the process-level shutdown signal.
//!
//! # Replies
//!
//! Mutating methods return the flags in effect *before* the call so a
//! caller can audit transitions. If the platform call fails the method
//! still succeeds at the protocol level: `flags` is
//! [`ExecFlags::UNKNOWN`] and `detail` carries the error text.
//!
//! # Failure Surface
//!
//! | Condition | Result |
//! |-----------|--------|
//! | manager not started | [`ServiceError::NotStarted`] |
//! | manager stopped | [`ServiceError::Stopped`] |
//! | shutdown already requested | [`ServiceError::ShuttingDown`] |
//! | platform call failed | `Ok(FlagsReply { flags: 0, detail: Some(..) })` |

mod error;
mod method;

pub use error::ServiceError;
pub use method::{Method, SERVICE_NAME};

use crate::manager::{LifecycleState, ManagerError, StateManager};
use crate::signal::ShutdownSignal;
use nosleep_types::ExecFlags;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Reply body of every flag-reporting method: `{ "flags": <u32> }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagsReply {
    /// Previous flags (mutating methods) or the current snapshot (`Read`).
    pub flags: ExecFlags,
    /// Native-call error text when the platform rejected the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl FlagsReply {
    #[must_use]
    pub fn new(flags: ExecFlags) -> Self {
        Self {
            flags,
            detail: None,
        }
    }

    /// Reply for a failed platform call.
    #[must_use]
    pub fn unknown(detail: impl Into<String>) -> Self {
        Self {
            flags: ExecFlags::UNKNOWN,
            detail: Some(detail.into()),
        }
    }
}

/// Result of a dispatched method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `Clear`, `Display`, `System`, `Critical`, `Read`.
    Flags(FlagsReply),
    /// `Shutdown`.
    Empty,
}

/// The control service shared by every connection.
#[derive(Debug, Clone)]
pub struct ControlService {
    manager: Arc<StateManager>,
    shutdown: ShutdownSignal,
}

impl ControlService {
    /// Creates a service over `manager`. `shutdown` is fired by the
    /// `Shutdown` method and observed by the dispatcher.
    #[must_use]
    pub fn new(manager: Arc<StateManager>, shutdown: ShutdownSignal) -> Self {
        Self { manager, shutdown }
    }

    /// Returns the shutdown signal this service fires.
    #[must_use]
    pub fn shutdown_signal(&self) -> &ShutdownSignal {
        &self.shutdown
    }

    /// Runs `method`.
    ///
    /// # Errors
    ///
    /// See the module-level failure table.
    pub async fn dispatch(&self, method: Method) -> Result<Reply, ServiceError> {
        match method {
            Method::Read => self.read().map(Reply::Flags),
            Method::Shutdown => self.shutdown().map(|()| Reply::Empty),
            Method::Clear => self.clear().await.map(Reply::Flags),
            Method::Display => self.display().await.map(Reply::Flags),
            Method::System => self.system().await.map(Reply::Flags),
            Method::Critical => self.critical().await.map(Reply::Flags),
        }
    }

    /// Releases all holds.
    pub async fn clear(&self) -> Result<FlagsReply, ServiceError> {
        self.set(Method::Clear).await
    }

    /// Keeps the system and the display awake.
    pub async fn display(&self) -> Result<FlagsReply, ServiceError> {
        self.set(Method::Display).await
    }

    /// Keeps the system awake; the display may sleep.
    pub async fn system(&self) -> Result<FlagsReply, ServiceError> {
        self.set(Method::System).await
    }

    /// Keeps the system doing background work in away mode.
    pub async fn critical(&self) -> Result<FlagsReply, ServiceError> {
        self.set(Method::Critical).await
    }

    /// Returns the manager's last recorded snapshot.
    ///
    /// Not ordered with in-flight mutations; may be stale.
    pub fn read(&self) -> Result<FlagsReply, ServiceError> {
        self.ensure_serving()?;
        let flags = self.manager.get_flags();
        info!(%flags, "Read RPC called");
        Ok(FlagsReply::new(flags))
    }

    /// Requests process-level shutdown.
    ///
    /// Only the first caller fires the signal; later callers get
    /// [`ServiceError::ShuttingDown`].
    pub fn shutdown(&self) -> Result<(), ServiceError> {
        self.ensure_serving()?;
        if !self.shutdown.try_fire() {
            return Err(ServiceError::ShuttingDown);
        }
        info!("Shutdown RPC called, shutting down server");
        Ok(())
    }

    async fn set(&self, method: Method) -> Result<FlagsReply, ServiceError> {
        let Some(flags) = method.target_flags() else {
            return Err(ServiceError::Internal(format!(
                "{method} does not set flags"
            )));
        };
        self.ensure_serving()?;

        match self.manager.set_flags(flags).await {
            Ok(previous) => {
                info!(%method, requested = %flags, %previous, "{method} RPC called");
                Ok(FlagsReply::new(previous))
            }
            Err(ManagerError::Platform(e)) => {
                warn!(%method, error = %e, "{method} RPC: platform call failed");
                Ok(FlagsReply::unknown(e.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn ensure_serving(&self) -> Result<(), ServiceError> {
        if self.shutdown.is_fired() {
            return Err(ServiceError::ShuttingDown);
        }
        match self.manager.state() {
            LifecycleState::Running => Ok(()),
            LifecycleState::Created => Err(ServiceError::NotStarted),
            LifecycleState::Stopped => Err(ServiceError::Stopped),
        }
    }
}
