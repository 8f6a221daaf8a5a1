//! Connection factory used by the connection manager.
//!
//! Production code connects over TCP; tests hand the manager in-memory
//! streams through their own [`Connector`].

use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

use crate::config::ClientConfig;

/// Read half of an established connection.
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Write half of an established connection.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// An established, full-duplex connection to the server.
pub struct Connection {
    /// Line stream from the server.
    pub reader: BoxedReader,

    /// Command sink to the server; bound to the same socket as `reader`.
    pub writer: BoxedWriter,

    /// Peer description for logging.
    pub peer: String,
}

impl Connection {
    pub fn new(reader: BoxedReader, writer: BoxedWriter, peer: impl Into<String>) -> Self {
        Self {
            reader,
            writer,
            peer: peer.into(),
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").field("peer", &self.peer).finish_non_exhaustive()
    }
}

/// Opens connections to the simulation server.
///
/// Called once per connection attempt. An `Err` counts as a failed attempt
/// and is retried after the configured delay.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Attempts to open one connection.
    async fn connect(&self) -> io::Result<Connection>;

    /// Human-readable target, for logging.
    fn target(&self) -> String;
}

// ============================================================================
// TCP Connector
// ============================================================================

/// Connects to `host:port` over TCP.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    host: String,
    port: u16,
}

impl TcpConnector {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.host.clone(), config.port)
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self) -> io::Result<Connection> {
        let stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        // Commands are tiny and latency matters more than batching
        stream.set_nodelay(true)?;

        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| self.target());
        debug!(peer = %peer, "TCP connection established");

        let (reader, writer) = stream.into_split();
        Ok(Connection::new(Box::new(reader), Box::new(writer), peer))
    }

    fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
