//! nosleep runtime.
//!
//! Keeps the host awake on request and exposes that control over a small
//! RPC surface.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌───────────────┐  newline JSON  ┌──────────────┐
//! │ rpc::Client   │ ─────────────► │ rpc::Server  │  one task per connection
//! └───────────────┘                └──────┬───────┘
//!                                         │ Method
//!                                         ▼
//!                                ┌──────────────────┐
//!                                │ ControlService   │ ──fire──► ShutdownSignal
//!                                └────────┬─────────┘
//!                                         │ set_flags / get_flags
//!                                         ▼
//!                                ┌──────────────────┐
//!                                │ StateManager     │  pinned worker thread
//!                                └────────┬─────────┘
//!                                         │
//!                                         ▼
//!                                ┌──────────────────┐
//!                                │ platform adapter │  SetThreadExecutionState
//!                                └──────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`platform`]: the native primitive and an in-process emulation
//! - [`manager`]: [`StateManager`], the only caller of the platform
//! - [`service`]: [`ControlService`], method → flags translation
//! - [`rpc`]: wire format, [`Server`] and [`Client`]
//! - [`signal`]: one-shot [`ShutdownSignal`]
//! - [`config`]: layered configuration
//!
//! # Example
//!
//! ```no_run
//! use nosleep_runtime::{ControlService, Endpoint, Network, Server, ShutdownSignal, StateManager};
//! use nosleep_runtime::platform::default_platform;
//! use nosleep_types::ExecFlags;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let server = Server::bind(&Endpoint::new(Network::Tcp, "127.0.0.1", 9001)).await?;
//!
//! let manager = Arc::new(StateManager::new(default_platform()));
//! manager.start()?;
//! manager.set_flags(ExecFlags::SYSTEM).await?;
//!
//! server.serve(ControlService::new(Arc::clone(&manager), ShutdownSignal::new())).await;
//! manager.stop()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod manager;
pub mod platform;
pub mod rpc;
pub mod service;
pub mod signal;

pub use config::{ConfigError, ConfigLoader, ConfigResolver, NosleepConfig};
pub use manager::{LifecycleState, ManagerError, StateManager};
pub use rpc::{Client, ClientError, Endpoint, Network, RpcError, Server};
pub use service::{ControlService, FlagsReply, Method, Reply, ServiceError};
pub use signal::ShutdownSignal;
