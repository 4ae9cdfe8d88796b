//! RPC transport for the control service.
//!
//! # Overview
//!
//! - [`Server`]: binds an [`Endpoint`] and serves every accepted connection
//!   against a shared [`ControlService`](crate::service::ControlService)
//! - [`Client`]: dials an endpoint and issues calls
//! - [`wire`]: newline-delimited JSON messages
//!
//! Each connection carries any number of sequential requests. Requests on
//! different connections are processed concurrently; mutations are then
//! serialized by the state manager.

mod client;
mod endpoint;
mod error;
mod server;
pub mod wire;

pub use client::Client;
pub use endpoint::{Endpoint, Network};
pub use error::{ClientError, RpcError};
pub use server::Server;
