//! Timed TCP client.
//!
//! Every operation takes its own deadline. A read may return fewer bytes
//! than the peer sent; framing is the caller's business.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::trace;

/// Client operation errors
#[derive(Debug)]
pub enum ClientError {
    /// The deadline passed before the operation could complete.
    TimedOut,
    /// The peer closed the connection.
    Disconnected,
    Io(io::Error),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::TimedOut => write!(f, "operation timed out"),
            ClientError::Disconnected => write!(f, "connection closed by peer"),
            ClientError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<io::Error> for ClientError {
    fn from(e: io::Error) -> Self {
        ClientError::Io(e)
    }
}

pub struct Client {
    stream: TcpStream,
}

impl Client {
    pub async fn connect(addr: SocketAddr, deadline: Duration) -> Result<Self, ClientError> {
        let stream = timeout(deadline, TcpStream::connect(addr))
            .await
            .map_err(|_| ClientError::TimedOut)??;
        trace!(addr = %addr, "Connected");
        Ok(Client { stream })
    }

    /// Write all of `data`, returning its length.
    pub async fn write(&mut self, data: &[u8], deadline: Duration) -> Result<usize, ClientError> {
        timeout(deadline, self.stream.write_all(data))
            .await
            .map_err(|_| ClientError::TimedOut)??;
        Ok(data.len())
    }

    /// Single read into `buf`. Returns the number of bytes read, which is
    /// always > 0 unless `buf` is empty.
    pub async fn read(&mut self, buf: &mut [u8], deadline: Duration) -> Result<usize, ClientError> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = timeout(deadline, self.stream.read(buf))
            .await
            .map_err(|_| ClientError::TimedOut)??;
        if n == 0 {
            return Err(ClientError::Disconnected);
        }
        Ok(n)
    }

    pub async fn close(mut self) -> Result<(), ClientError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
