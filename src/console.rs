//! Plain-text transcript written to stdout.
//!
//! This is the program's user-facing output, separate from the `tracing`
//! diagnostics on stderr: one line when listening, one per accept, the text
//! received, and one per close.

use std::io::Write;
use std::net::SocketAddr;

/// Sink for the connection transcript.
pub trait Console: Send + Sync {
    /// Write `bytes` followed by a newline, unmodified.
    fn write_line(&self, bytes: &[u8]);

    fn line(&self, text: &str) {
        self.write_line(text.as_bytes());
    }

    fn listening(&self, addr: SocketAddr) {
        self.line(&format!("listening: {addr}"));
    }

    fn accepted(&self, peer: SocketAddr) {
        self.line(&format!("accept: {peer}"));
    }

    /// Bytes pass through as received, valid UTF-8 or not.
    fn received(&self, data: &[u8]) {
        self.write_line(data);
    }

    fn closed(&self, peer: SocketAddr) {
        self.line(&format!("close: {peer}"));
    }
}

/// Writes the transcript to the process stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stdout;

impl Console for Stdout {
    fn write_line(&self, bytes: &[u8]) {
        // A closed stdout must not take a handler down with it.
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(bytes);
        let _ = out.write_all(b"\n");
        let _ = out.flush();
    }
}
