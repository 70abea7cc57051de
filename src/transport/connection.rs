//! Async TCP connection wrapper for the Winbox transport.
//!
//! Owns one socket and provides raw byte send/receive with a configurable
//! connect/read timeout. Framing and message semantics live one layer up.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::core::constants::{DEFAULT_PORT, DEFAULT_TIMEOUT};
use crate::core::error::WinboxError;

/// A connected TCP socket with timeout-bounded I/O.
#[derive(Debug)]
pub struct TcpConnection {
    /// The underlying TCP stream.
    stream: TcpStream,
    /// Deadline applied to connect and to each read.
    timeout: Duration,
}

impl TcpConnection {
    /// Connect to `host:port` within the given timeout.
    pub async fn connect(host: &str, port: u16, dur: Duration) -> Result<Self, WinboxError> {
        let stream = timeout(dur, TcpStream::connect((host, port)))
            .await
            .map_err(|_| WinboxError::Timeout)??;
        Ok(Self {
            stream,
            timeout: dur,
        })
    }

    /// Connect to the default Winbox port with the default timeout.
    pub async fn connect_default(host: &str) -> Result<Self, WinboxError> {
        Self::connect(host, DEFAULT_PORT, DEFAULT_TIMEOUT).await
    }

    /// Wrap an already-connected stream.
    pub fn from_stream(stream: TcpStream) -> Self {
        Self {
            stream,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Change the per-read timeout.
    pub fn set_timeout(&mut self, dur: Duration) {
        self.timeout = dur;
    }

    /// The configured per-read timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The remote peer's address.
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.peer_addr()
    }

    /// The local socket address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.stream.local_addr()
    }

    /// Write all bytes to the socket.
    pub async fn send_bytes(&mut self, bytes: &[u8]) -> Result<(), WinboxError> {
        self.stream.write_all(bytes).await?;
        Ok(())
    }

    /// Read up to `max` bytes from the socket.
    ///
    /// Fails with [`WinboxError::Disconnected`] if the peer closed the
    /// connection, and [`WinboxError::Timeout`] if no bytes arrive within the
    /// configured timeout.
    pub async fn recv_bytes(&mut self, max: usize) -> Result<Vec<u8>, WinboxError> {
        let mut buf = vec![0u8; max];
        let n = timeout(self.timeout, self.stream.read(&mut buf))
            .await
            .map_err(|_| WinboxError::Timeout)??;
        if n == 0 {
            return Err(WinboxError::Disconnected);
        }
        buf.truncate(n);
        Ok(buf)
    }

    /// Shut down the connection.
    pub async fn close(mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }
}
