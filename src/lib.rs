//! reply-server: a TCP server that answers every connection with a fixed reply
//!
//! Each accepted connection is served by its own task:
//! - one read of up to `buffer_size` bytes
//! - the received text is printed to stdout
//! - the fixed reply is written back
//! - the connection is closed
//!
//! A small timed client for exercising the server lives in [`client`].

pub mod client;
pub mod config;
pub mod console;
pub mod handler;
pub mod server;
