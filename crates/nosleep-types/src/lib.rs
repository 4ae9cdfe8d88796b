//! Core types for nosleep.
//!
//! - [`ExecFlags`]: the execution-state bitmask exchanged with the platform
//!   and reported to RPC callers.
//! - [`ErrorCode`]: the error-code contract implemented by every error
//!   enum in the workspace.
//!
//! The runtime crate (`nosleep-runtime`) builds the state manager, control
//! service and RPC plumbing on top of these.

pub mod error;
pub mod flags;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use flags::ExecFlags;
