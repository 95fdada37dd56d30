//! Stream transport seam between the session client and the network

use async_trait::async_trait;
use std::io;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::debug;

/// Relay address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Read half of a session stream
pub trait SessionReader: Send {
    /// Read whatever is already buffered without waiting.
    ///
    /// Returns `ErrorKind::WouldBlock` when nothing is available and
    /// `Ok(0)` when the peer closed the stream.
    fn try_read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Write half of a session stream
#[async_trait]
pub trait SessionWriter: Send {
    /// Write the whole buffer
    async fn send(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Shut the stream down
    async fn close(&mut self) -> io::Result<()>;
}

/// Opens session streams
#[async_trait]
pub trait Connector: Send + Sync {
    type Reader: SessionReader;
    type Writer: SessionWriter;

    /// Make one connection attempt
    async fn connect(&self, endpoint: &Endpoint) -> io::Result<(Self::Reader, Self::Writer)>;
}

/// TCP transport
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    type Reader = OwnedReadHalf;
    type Writer = OwnedWriteHalf;

    async fn connect(&self, endpoint: &Endpoint) -> io::Result<(OwnedReadHalf, OwnedWriteHalf)> {
        let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port)).await?;
        stream.set_nodelay(true)?;
        debug!(endpoint = %endpoint, local = ?stream.local_addr().ok(), "TCP stream open");
        Ok(stream.into_split())
    }
}

impl SessionReader for OwnedReadHalf {
    fn try_read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.try_read(buf)
    }
}

#[async_trait]
impl SessionWriter for OwnedWriteHalf {
    async fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes).await?;
        self.flush().await
    }

    async fn close(&mut self) -> io::Result<()> {
        self.shutdown().await
    }
}
