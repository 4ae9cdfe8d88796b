//! Connection dispatcher.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────── Server::serve ──────────────────────────┐
//! │                                                                     │
//! │  select! (biased)                                                   │
//! │    shutdown.wait()        ──► stop accepting                        │
//! │    connections.join_next ──► reap finished connection tasks         │
//! │    listener.accept()     ──► spawn serve_connection ──► JoinSet     │
//! │                                                                     │
//! │  serve_connection                                                   │
//! │    select! (biased)                                                 │
//! │      shutdown.wait()     ──► close                                  │
//! │      next line           ──► decode ──► ControlService ──► reply    │
//! └─────────────────────────────────────────────────────────────────────┘
//!            │
//!            ▼
//!   drop listener ──► await connection tasks ──► return
//! ```
//!
//! A request that was already read when shutdown fires still gets its
//! reply; the connection closes right after.

use super::endpoint::Endpoint;
use super::wire::{encode_line, Request, Response};
use super::RpcError;
use crate::service::{ControlService, Reply};
use serde_json::Value;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Pause after a failed accept so a persistent error (e.g. fd exhaustion)
/// does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// A bound listener, ready to serve.
#[derive(Debug)]
pub struct Server {
    listener: Listener,
    endpoint: Endpoint,
}

impl Server {
    /// Binds `endpoint`.
    ///
    /// # Errors
    ///
    /// [`RpcError::Resolve`] or [`RpcError::Bind`]. Both are fatal for the
    /// server process.
    pub async fn bind(endpoint: &Endpoint) -> Result<Self, RpcError> {
        let bind_err = |source| RpcError::Bind {
            endpoint: endpoint.to_string(),
            source,
        };

        let (listener, endpoint) = match endpoint {
            Endpoint::Tcp { network, .. } => {
                let addr = endpoint.resolve().await?;
                let listener = TcpListener::bind(addr).await.map_err(bind_err)?;
                let local = listener.local_addr().map_err(bind_err)?;
                let bound = Endpoint::new(*network, local.ip().to_string(), local.port());
                (Listener::Tcp(listener), bound)
            }
            #[cfg(unix)]
            Endpoint::Unix { path } => {
                let socket = unix::UnixSocket::bind(path.clone()).map_err(bind_err)?;
                (Listener::Unix(socket), endpoint.clone())
            }
            #[cfg(not(unix))]
            Endpoint::Unix { .. } => {
                return Err(RpcError::UnsupportedNetwork("unix".to_string()));
            }
        };

        debug!("Bound listener on {endpoint}");
        Ok(Self { listener, endpoint })
    }

    /// The endpoint actually bound. For TCP port 0 this carries the
    /// assigned port.
    #[must_use]
    pub fn local_endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Accepts connections until `service`'s shutdown signal fires.
    ///
    /// Returns after the listener is closed and every connection task has
    /// finished.
    pub async fn serve(self, service: ControlService) {
        let Self {
            mut listener,
            endpoint,
        } = self;
        let shutdown = service.shutdown_signal().clone();
        let mut connections: JoinSet<()> = JoinSet::new();

        info!("Nosleep RPC server listening on {endpoint}");

        loop {
            tokio::select! {
                biased;

                () = shutdown.wait() => {
                    debug!("Accept loop received shutdown");
                    break;
                }

                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    log_join(joined);
                }

                accepted = listener.accept() => match accepted {
                    Ok(conn) => {
                        let service = service.clone();
                        connections.spawn(async move {
                            match conn {
                                Accepted::Tcp(stream, peer) => {
                                    serve_connection(stream, peer, service).await;
                                }
                                #[cfg(unix)]
                                Accepted::Unix(stream) => {
                                    serve_connection(stream, "unix".to_string(), service).await;
                                }
                            }
                        });
                    }
                    Err(e) if is_listener_closed(&e) => {
                        info!("Listener closed, leaving accept loop");
                        break;
                    }
                    Err(e) => {
                        warn!("accept error: {e}");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
            }
        }

        drop(listener);
        debug!(active = connections.len(), "Waiting for connections to close");
        while let Some(joined) = connections.join_next().await {
            log_join(joined);
        }
        info!("RPC server shutdown complete");
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        if e.is_panic() {
            warn!("connection task panicked: {e}");
        }
    }
}

#[derive(Debug)]
enum Listener {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(unix::UnixSocket),
}

enum Accepted {
    Tcp(TcpStream, String),
    #[cfg(unix)]
    Unix(tokio::net::UnixStream),
}

impl Listener {
    async fn accept(&mut self) -> io::Result<Accepted> {
        match self {
            Self::Tcp(listener) => {
                let (stream, peer) = listener.accept().await?;
                Ok(Accepted::Tcp(stream, peer.to_string()))
            }
            #[cfg(unix)]
            Self::Unix(socket) => {
                let (stream, _) = socket.listener.accept().await?;
                Ok(Accepted::Unix(stream))
            }
        }
    }
}

/// Serves one connection until EOF, a malformed request, or shutdown.
async fn serve_connection<S>(stream: S, peer: String, service: ControlService)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    debug!(%peer, "Connection opened");
    let shutdown = service.shutdown_signal().clone();
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = BufReader::new(reader).lines();

    loop {
        let next = tokio::select! {
            biased;

            () = shutdown.wait() => break,
            next = lines.next_line() => next,
        };

        let line = match next {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                debug!(%peer, "read error: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let (response, keep_open) = match serde_json::from_str::<Request>(&line) {
            Ok(request) => (handle_request(&service, request).await, true),
            Err(e) => {
                warn!(%peer, "malformed request: {e}");
                (Response::err(0, format!("rpc: invalid request: {e}")), false)
            }
        };

        if let Err(e) = write_response(&mut writer, &response).await {
            debug!(%peer, "write error: {e}");
            break;
        }
        if !keep_open {
            break;
        }
    }

    let _ = writer.shutdown().await;
    debug!(%peer, "Connection closed");
}

async fn handle_request(service: &ControlService, request: Request) -> Response {
    let method = match request.resolve_method() {
        Ok(method) => method,
        Err(message) => {
            debug!("{message}");
            return Response::err(request.id, message);
        }
    };

    match service.dispatch(method).await {
        Ok(Reply::Flags(reply)) => match serde_json::to_value(reply) {
            Ok(value) => Response::ok(request.id, value),
            Err(e) => Response::err(request.id, format!("rpc: encoding reply: {e}")),
        },
        Ok(Reply::Empty) => Response::ok(request.id, Value::Object(serde_json::Map::new())),
        Err(e) => Response::err(request.id, e.to_string()),
    }
}

async fn write_response<W>(writer: &mut W, response: &Response) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let line = encode_line(response).map_err(io::Error::other)?;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}

/// Returns `true` for accept errors that mean the listener itself is gone.
fn is_listener_closed(err: &io::Error) -> bool {
    #[cfg(unix)]
    const CLOSED: [i32; 2] = [9 /* EBADF */, 22 /* EINVAL */];
    #[cfg(windows)]
    const CLOSED: [i32; 2] = [10038 /* WSAENOTSOCK */, 10004 /* WSAEINTR */];
    #[cfg(not(any(unix, windows)))]
    const CLOSED: [i32; 0] = [];

    err.raw_os_error().is_some_and(|code| CLOSED.contains(&code))
}

#[cfg(unix)]
mod unix {
    use std::io;
    use std::path::PathBuf;
    use tokio::net::UnixListener;
    use tracing::debug;

    /// A unix listener that removes its socket file when dropped.
    #[derive(Debug)]
    pub(super) struct UnixSocket {
        pub(super) listener: UnixListener,
        path: PathBuf,
    }

    impl UnixSocket {
        pub(super) fn bind(path: PathBuf) -> io::Result<Self> {
            let listener = UnixListener::bind(&path)?;
            Ok(Self { listener, path })
        }
    }

    impl Drop for UnixSocket {
        fn drop(&mut self) {
            if let Err(e) = std::fs::remove_file(&self.path) {
                debug!("could not remove socket {}: {e}", self.path.display());
            }
        }
    }
}
