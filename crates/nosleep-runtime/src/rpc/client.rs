//! RPC client.
//!
//! One [`Client`] owns one connection and issues calls sequentially.
//! Once the connection is lost every further call fails fast with
//! [`ClientError::Shutdown`].

use super::endpoint::Endpoint;
use super::wire::{encode_line, Request, Response};
use super::ClientError;
use crate::service::{FlagsReply, Method, Reply};
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tracing::debug;

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Connection to a nosleep control server.
pub struct Client {
    endpoint: Endpoint,
    reader: Lines<BufReader<BoxedReader>>,
    writer: BoxedWriter,
    next_id: u64,
    closed: bool,
}

impl Client {
    /// Connects to `endpoint`.
    ///
    /// # Errors
    ///
    /// [`ClientError::Connect`] if the server cannot be reached.
    pub async fn connect(endpoint: &Endpoint) -> Result<Self, ClientError> {
        let connect_err = |source| ClientError::Connect {
            endpoint: endpoint.to_string(),
            source,
        };

        let (reader, writer): (BoxedReader, BoxedWriter) = match endpoint {
            Endpoint::Tcp { .. } => {
                let addr = endpoint.resolve().await.map_err(|e| {
                    connect_err(io::Error::new(io::ErrorKind::AddrNotAvailable, e.to_string()))
                })?;
                let stream = TcpStream::connect(addr).await.map_err(connect_err)?;
                let (r, w) = stream.into_split();
                (Box::new(r), Box::new(w))
            }
            #[cfg(unix)]
            Endpoint::Unix { path } => {
                let stream = tokio::net::UnixStream::connect(path)
                    .await
                    .map_err(connect_err)?;
                let (r, w) = stream.into_split();
                (Box::new(r), Box::new(w))
            }
            #[cfg(not(unix))]
            Endpoint::Unix { .. } => {
                return Err(connect_err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "unix sockets are not supported on this platform",
                )));
            }
        };

        debug!("Connected to {endpoint}");
        Ok(Self {
            endpoint: endpoint.clone(),
            reader: BufReader::new(reader).lines(),
            writer,
            // Id 0 is reserved for connection-level rejections.
            next_id: 1,
            closed: false,
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns `true` once the connection is known to be gone.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Calls `method` and waits for its reply.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Shutdown`]: the connection is closed
    /// - [`ClientError::Remote`]: the server rejected the request
    /// - [`ClientError::Protocol`]: the reply could not be understood
    pub async fn call(&mut self, method: Method) -> Result<Reply, ClientError> {
        if self.closed {
            return Err(ClientError::Shutdown);
        }

        let id = self.next_id;
        self.next_id += 1;

        let line = encode_line(&Request::new(id, method))
            .map_err(|e| ClientError::Protocol(format!("encoding request: {e}")))?;
        let sent = match self.writer.write_all(line.as_bytes()).await {
            Ok(()) => self.writer.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = sent {
            return Err(self.connection_lost(e));
        }

        let received = self.reader.next_line().await;
        let line = match received {
            Ok(Some(line)) => line,
            Ok(None) => {
                self.closed = true;
                return Err(ClientError::Shutdown);
            }
            Err(e) => return Err(self.connection_lost(e)),
        };

        let response: Response = serde_json::from_str(&line)
            .map_err(|e| ClientError::Protocol(format!("invalid response: {e}")))?;
        if let Some(message) = response.error {
            if response.id != id {
                // Connection-level rejection; the server closes after it.
                self.closed = true;
            }
            return Err(ClientError::Remote(message));
        }
        if response.id != id {
            return Err(ClientError::Protocol(format!(
                "response id {} does not match request id {id}",
                response.id
            )));
        }

        if method == Method::Shutdown {
            return Ok(Reply::Empty);
        }
        let result = response
            .result
            .ok_or_else(|| ClientError::Protocol("response has neither result nor error".into()))?;
        serde_json::from_value(result)
            .map(Reply::Flags)
            .map_err(|e| ClientError::Protocol(format!("invalid reply body: {e}")))
    }

    pub async fn clear(&mut self) -> Result<FlagsReply, ClientError> {
        self.call_flags(Method::Clear).await
    }

    pub async fn display(&mut self) -> Result<FlagsReply, ClientError> {
        self.call_flags(Method::Display).await
    }

    pub async fn system(&mut self) -> Result<FlagsReply, ClientError> {
        self.call_flags(Method::System).await
    }

    pub async fn critical(&mut self) -> Result<FlagsReply, ClientError> {
        self.call_flags(Method::Critical).await
    }

    pub async fn read(&mut self) -> Result<FlagsReply, ClientError> {
        self.call_flags(Method::Read).await
    }

    /// Asks the server to stop. The server closes this connection after
    /// replying.
    pub async fn shutdown(&mut self) -> Result<(), ClientError> {
        self.call(Method::Shutdown).await.map(|_| ())
    }

    async fn call_flags(&mut self, method: Method) -> Result<FlagsReply, ClientError> {
        match self.call(method).await? {
            Reply::Flags(reply) => Ok(reply),
            Reply::Empty => Err(ClientError::Protocol(format!(
                "{method} returned an empty reply"
            ))),
        }
    }

    fn connection_lost(&mut self, err: io::Error) -> ClientError {
        use io::ErrorKind::{
            BrokenPipe, ConnectionAborted, ConnectionReset, NotConnected, UnexpectedEof,
        };

        if matches!(
            err.kind(),
            BrokenPipe | ConnectionAborted | ConnectionReset | NotConnected | UnexpectedEof
        ) {
            debug!("Connection to {} lost: {err}", self.endpoint);
            self.closed = true;
            ClientError::Shutdown
        } else {
            ClientError::Io(err)
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint)
            .field("next_id", &self.next_id)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::Network;
    use serde_json::json;
    use tokio::net::TcpListener;

    /// Accepts one connection and answers each request with `reply(id)`,
    /// returning the ids it saw once the client hangs up.
    async fn scripted_server(
        reply: fn(u64) -> Response,
    ) -> (Endpoint, tokio::task::JoinHandle<Vec<u64>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let task = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let (reader, mut writer) = stream.into_split();
            let mut lines = BufReader::new(reader).lines();
            let mut ids = Vec::new();
            while let Ok(Some(line)) = lines.next_line().await {
                let request: Request = serde_json::from_str(&line).expect("request json");
                ids.push(request.id);
                let line = encode_line(&reply(request.id)).expect("encode");
                if writer.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
            }
            ids
        });
        (Endpoint::new(Network::Tcp, "127.0.0.1", port), task)
    }

    #[tokio::test]
    async fn request_ids_start_at_one() {
        let (endpoint, server) =
            scripted_server(|id| Response::ok(id, json!({ "flags": 0 }))).await;

        let mut client = Client::connect(&endpoint).await.expect("connect");
        client.read().await.expect("first call");
        client.read().await.expect("second call");
        drop(client);

        assert_eq!(server.await.expect("server task"), vec![1, 2]);
    }

    #[tokio::test]
    async fn id_zero_error_on_first_call_closes_client() {
        let (endpoint, _server) =
            scripted_server(|_| Response::err(0, "rpc: invalid request: boom")).await;

        let mut client = Client::connect(&endpoint).await.expect("connect");
        let err = client.read().await.expect_err("rejected");
        assert!(matches!(&err, ClientError::Remote(msg) if msg.contains("invalid request")));
        assert!(client.is_closed());
        assert!(client.read().await.expect_err("closed").is_shutdown());
    }
}
