//! Connects to a reply-server, sends one message and prints what comes back.

use clap::Parser;
use reply_server::client::Client;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reply-client")]
#[command(version = "0.1.0")]
#[command(about = "Send one message to a reply-server and print the reply", long_about = None)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8989")]
    addr: SocketAddr,

    /// Message to send
    #[arg(short, long, default_value = "hello world")]
    message: String,

    /// Deadline for each of connect, write and read, in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    timeout_ms: u64,

    /// Size of the read buffer in bytes
    #[arg(short, long, default_value_t = 200)]
    buffer_size: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let deadline = Duration::from_millis(args.timeout_ms);

    let mut client = Client::connect(args.addr, deadline).await?;
    println!("connect: {}", args.addr);

    let written = client.write(args.message.as_bytes(), deadline).await?;
    println!("write: {written}");

    let mut buf = vec![0u8; args.buffer_size];
    let n = client.read(&mut buf, deadline).await?;
    println!("read: {n} [{}]", String::from_utf8_lossy(&buf[..n]));

    // The server closes first; a failed shutdown here is not interesting.
    let _ = client.close().await;
    Ok(())
}
