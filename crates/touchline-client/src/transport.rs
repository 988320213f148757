//! Byte-stream transport for the client.
//!
//! Opens the connection that [`ClientAction::Connect`](crate::ClientAction)
//! asks for. This is a thin layer that only produces a stream; framing and
//! protocol logic stay in the Sans-IO [`Client`](crate::Client).

use std::{future::Future, io};

use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};
use tracing::debug;

/// Opens broker connections.
///
/// # Implementations
///
/// - [`TcpConnector`]: Plain TCP, used by the binary
/// - Tests: in-memory duplex streams with a scripted broker
pub trait Connector: Send + Sync {
    /// Connected byte stream.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Connect to `addr` (`host:port`).
    ///
    /// # Errors
    ///
    /// Returns an error if the address does not resolve or the connection is
    /// refused.
    fn connect(&self, addr: &str) -> impl Future<Output = io::Result<Self::Stream>> + Send;
}

/// Connects over TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, addr: &str) -> io::Result<TcpStream> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        debug!(addr, peer = ?stream.peer_addr().ok(), "tcp connected");
        Ok(stream)
    }
}
