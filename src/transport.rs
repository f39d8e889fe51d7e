//! Raw TCP transport: one connection per request, no reuse.
//!
//! A response is considered complete when the peer closes the connection or
//! when no bytes arrive within the configured receive timeout. Keep-alive
//! servers never close, so for them the idle timeout is the normal end of a
//! response rather than an error. See [`ResponseCompletion`] for the stricter
//! length-driven alternative.

use std::net::SocketAddr;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::codec::{Request, framed_len};
use crate::config::{ResponseCompletion, ServerConfig, TransportConfig};
use crate::error::TransportError;

/// Abstraction over a single request/response exchange, enabling testability.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the raw response bytes
    async fn round_trip(&self, request: &Request) -> Result<Vec<u8>, TransportError>;
}

/// Production [`Transport`] opening a fresh TCP connection per request.
#[derive(Clone, Debug)]
pub struct TcpTransport {
    server: ServerConfig,
    config: TransportConfig,
}

impl TcpTransport {
    /// Transport for `server` with the given socket settings
    pub fn new(server: ServerConfig, config: TransportConfig) -> Self {
        Self { server, config }
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn round_trip(&self, request: &Request) -> Result<Vec<u8>, TransportError> {
        let mut conn = Connection::open(&self.server, &self.config).await?;
        let result = async {
            conn.send(&request.to_bytes()).await?;
            conn.receive(request.method().expects_body()).await
        }
        .await;
        conn.close().await;
        result
    }
}

/// An ephemeral, single-use TCP connection to the server
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    config: TransportConfig,
}

impl Connection {
    /// Connect to `server`
    pub async fn open(
        server: &ServerConfig,
        config: &TransportConfig,
    ) -> Result<Self, TransportError> {
        let addr = server.authority();
        let stream = TcpStream::connect((server.host.as_str(), server.port))
            .await
            .map_err(|e| TransportError::Connect {
                addr: addr.clone(),
                source: e,
            })?;
        let peer = stream.peer_addr().map_err(|e| TransportError::Connect {
            addr: addr.clone(),
            source: e,
        })?;
        tracing::debug!(%peer, "Connection opened");
        Ok(Self {
            stream,
            peer,
            config: config.clone(),
        })
    }

    /// Remote address of this connection
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Write the whole request
    pub async fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.stream
            .write_all(bytes)
            .await
            .map_err(|e| TransportError::Write {
                addr: self.peer,
                source: e,
            })?;
        tracing::debug!(peer = %self.peer, bytes = bytes.len(), "Request written");
        Ok(())
    }

    /// Read the response until close, idle timeout, or (if configured) full framing
    pub async fn receive(&mut self, expects_body: bool) -> Result<Vec<u8>, TransportError> {
        let peer = self.peer;
        read_response(&mut self.stream, &self.config, expects_body)
            .await
            .map_err(|e| TransportError::Read {
                addr: peer,
                source: e,
            })
    }

    /// Shut down the write half and drop the socket
    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            tracing::trace!(peer = %self.peer, error = %e, "Shutdown after response failed");
        }
    }
}

/// How a read loop terminated
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ReadEnd {
    PeerClosed,
    IdleTimeout,
    Framed,
}

/// Accumulate a response from `reader` in `read_buffer_size` reads.
///
/// Stops on a zero-length read, on a read that does not complete within
/// `receive_timeout`, or (under [`ResponseCompletion::ContentLength`]) once the
/// response is fully framed. Any other read error is returned.
pub(crate) async fn read_response<R>(
    reader: &mut R,
    config: &TransportConfig,
    expects_body: bool,
) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; config.read_buffer_size];
    let mut response = Vec::new();

    let end = loop {
        if config.completion == ResponseCompletion::ContentLength
            && framed_len(&response, expects_body).is_some_and(|len| response.len() >= len)
        {
            break ReadEnd::Framed;
        }
        match tokio::time::timeout(config.receive_timeout, reader.read(&mut buf)).await {
            Err(_) => break ReadEnd::IdleTimeout,
            Ok(Ok(0)) => break ReadEnd::PeerClosed,
            Ok(Ok(n)) => response.extend_from_slice(&buf[..n]),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Ok(Err(e)) => return Err(e),
        }
    };

    tracing::debug!(bytes = response.len(), end = ?end, "Response read");
    Ok(response)
}
