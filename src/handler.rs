//! Per-connection handler.
//!
//! A connection gets exactly one read of at most `buffer_size` bytes. Whatever
//! arrives is printed to the console and answered with the fixed reply, then
//! the connection is closed. There is no framing and no loop: bytes beyond the
//! first read are never looked at.

use crate::config::Config;
use crate::console::Console;
use bytes::{Bytes, BytesMut};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

/// Shared, read-only settings for every handler task.
pub struct Handler {
    reply: Bytes,
    buffer_size: usize,
    console: Arc<dyn Console>,
}

impl Handler {
    pub fn new(reply: impl Into<Bytes>, buffer_size: usize, console: Arc<dyn Console>) -> Self {
        Self {
            reply: reply.into(),
            buffer_size,
            console,
        }
    }

    pub fn from_config(config: &Config, console: Arc<dyn Console>) -> Self {
        Self::new(config.reply.clone().into_bytes(), config.buffer_size, console)
    }

    /// Serve one connection from accept to close.
    ///
    /// Never fails: read and write errors end the exchange early, and every
    /// exit path (including a panic while serving) closes the stream and
    /// prints the close notice.
    pub async fn handle<S>(&self, stream: S, peer: SocketAddr)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        self.console.accepted(peer);

        let mut conn = Teardown {
            stream: Some(stream),
            peer,
            console: &*self.console,
        };
        if let Some(stream) = conn.stream.as_mut() {
            self.exchange(stream, peer).await;
        }
        conn.close().await;
    }

    async fn exchange<S>(&self, stream: &mut S, peer: SocketAddr)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut buffer = BytesMut::zeroed(self.buffer_size);

        let n = match stream.read(&mut buffer[..]).await {
            Ok(0) => {
                debug!(peer = %peer, "Peer closed before sending data");
                return;
            }
            Ok(n) => n,
            Err(e) => {
                debug!(peer = %peer, error = %e, "Read failed");
                return;
            }
        };
        buffer.truncate(n);
        trace!(peer = %peer, bytes = n, "Read request");

        self.console.received(&buffer);

        match stream.write_all(&self.reply).await {
            Ok(()) => trace!(peer = %peer, bytes = self.reply.len(), "Wrote reply"),
            Err(e) => debug!(peer = %peer, error = %e, "Write failed"),
        }
    }
}

/// Owns the stream for the lifetime of a handler.
///
/// Dropping it closes the stream and then prints the close notice, so the
/// notice also appears when the handler unwinds.
struct Teardown<'a, S> {
    stream: Option<S>,
    peer: SocketAddr,
    console: &'a dyn Console,
}

impl<S> Teardown<'_, S>
where
    S: AsyncWrite + Unpin,
{
    async fn close(mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                trace!(peer = %self.peer, error = %e, "Shutdown failed");
            }
        }
    }
}

impl<S> Drop for Teardown<'_, S> {
    fn drop(&mut self) {
        drop(self.stream.take());
        self.console.closed(self.peer);
    }
}
