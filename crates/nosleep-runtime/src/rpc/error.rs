//! RPC transport errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`RpcError::UnsupportedNetwork`] | `RPC_UNSUPPORTED_NETWORK` | No |
//! | [`RpcError::Resolve`] | `RPC_RESOLVE_FAILED` | No |
//! | [`RpcError::Bind`] | `RPC_BIND_FAILED` | No |
//! | [`ClientError::Connect`] | `CLIENT_CONNECT_FAILED` | No |
//! | [`ClientError::Shutdown`] | `CLIENT_SHUTDOWN` | No |
//! | [`ClientError::Remote`] | `CLIENT_REMOTE_ERROR` | Yes |
//! | [`ClientError::Protocol`] | `CLIENT_PROTOCOL_ERROR` | No |
//! | [`ClientError::Io`] | `CLIENT_IO_ERROR` | No |

use nosleep_types::ErrorCode;
use std::io;
use thiserror::Error;

/// Server-side transport error.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Network kind not supported on this platform.
    #[error("unsupported network '{0}' (expected tcp, tcp4, tcp6 or unix)")]
    UnsupportedNetwork(String),

    /// Address did not resolve to a usable socket address.
    #[error("failed to resolve {endpoint}: {source}")]
    Resolve {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// Listener could not be bound.
    #[error("failed to listen on {endpoint}: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: io::Error,
    },
}

impl ErrorCode for RpcError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedNetwork(_) => "RPC_UNSUPPORTED_NETWORK",
            Self::Resolve { .. } => "RPC_RESOLVE_FAILED",
            Self::Bind { .. } => "RPC_BIND_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Client-side call error.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Could not reach the server.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// The connection is closed; no further calls will succeed.
    #[error("connection is shut down")]
    Shutdown,

    /// The server answered with a request-level error.
    #[error("remote error: {0}")]
    Remote(String),

    /// The server sent something that is not a valid response.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Other I/O failure on an open connection.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ClientError {
    /// Returns `true` if the connection can no longer be used.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        matches!(self, Self::Shutdown)
    }
}

impl ErrorCode for ClientError {
    fn code(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "CLIENT_CONNECT_FAILED",
            Self::Shutdown => "CLIENT_SHUTDOWN",
            Self::Remote(_) => "CLIENT_REMOTE_ERROR",
            Self::Protocol(_) => "CLIENT_PROTOCOL_ERROR",
            Self::Io(_) => "CLIENT_IO_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nosleep_types::assert_error_codes;

    #[test]
    fn rpc_error_codes_valid() {
        assert_error_codes(
            &[
                RpcError::UnsupportedNetwork("udp".into()),
                RpcError::Resolve {
                    endpoint: "x".into(),
                    source: io::Error::other("x"),
                },
                RpcError::Bind {
                    endpoint: "x".into(),
                    source: io::Error::other("x"),
                },
            ],
            "RPC_",
        );
    }

    #[test]
    fn client_error_codes_valid() {
        assert_error_codes(
            &[
                ClientError::Connect {
                    endpoint: "x".into(),
                    source: io::Error::other("x"),
                },
                ClientError::Shutdown,
                ClientError::Remote("x".into()),
                ClientError::Protocol("x".into()),
                ClientError::Io(io::Error::other("x")),
            ],
            "CLIENT_",
        );
    }

    #[test]
    fn bind_error_names_endpoint() {
        let err = RpcError::Bind {
            endpoint: "127.0.0.1:9001 (tcp)".into(),
            source: io::Error::from(io::ErrorKind::AddrInUse),
        };
        assert!(err.to_string().contains("127.0.0.1:9001"));
    }
}
