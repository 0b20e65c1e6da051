//! TCP listener loop.
//!
//! Accepts connections forever and hands each one to its own `tokio` task.
//! There is no connection limit and no supervision: handler tasks are
//! detached the moment they are spawned, and a peer that never sends
//! anything keeps its task (and socket) alive until the process is killed.

use crate::config::Config;
use crate::console::Console;
use crate::handler::Handler;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Server instance with a bound listening socket
pub struct Server {
    listener: TcpListener,
    handler: Arc<Handler>,
    console: Arc<dyn Console>,
}

impl Server {
    /// Bind the configured address.
    ///
    /// Failure here is the only fatal error the server has.
    pub async fn bind(config: &Config, console: Arc<dyn Console>) -> io::Result<Self> {
        let listener = TcpListener::bind(&config.listen).await?;
        let handler = Arc::new(Handler::from_config(config, Arc::clone(&console)));

        Ok(Server {
            listener,
            handler,
            console,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the process is killed.
    pub async fn run(self) {
        if let Ok(addr) = self.listener.local_addr() {
            info!(address = %addr, "Server listening");
            self.console.listening(addr);
        }

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    debug!(peer = %addr, "New connection");

                    let handler = Arc::clone(&self.handler);
                    tokio::spawn(async move {
                        handler.handle(stream, addr).await;
                    });
                }
                // Retried immediately; there is no backoff.
                Err(e) => {
                    debug!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::recording::Recording;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn config() -> Config {
        Config {
            listen: "127.0.0.1:0".to_string(),
            ..Config::default()
        }
    }

    async fn start() -> (SocketAddr, Arc<Recording>) {
        let console = Arc::new(Recording::default());
        let server = Server::bind(&config(), console.clone()).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());
        (addr, console)
    }

    async fn wait_for(console: &Recording, line: &str) {
        for _ in 0..200 {
            if console.contains(line) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("transcript never contained {line:?}: {:?}", console.lines());
    }

    #[tokio::test]
    async fn test_ping_scenario() {
        let (addr, console) = start().await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        let local = client.local_addr().unwrap();
        client.write_all(b"ping").await.unwrap();

        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, b"hellohellohello");

        let close = format!("close: {local}");
        wait_for(&console, &close).await;

        let lines = console.lines();
        let accept = lines
            .iter()
            .position(|l| *l == format!("accept: {local}"))
            .unwrap();
        let ping = lines.iter().position(|l| l == "ping").unwrap();
        let closed = lines.iter().position(|l| *l == close).unwrap();
        assert!(accept < ping && ping < closed);
        assert!(lines[0].starts_with("listening: "));
    }

    #[tokio::test]
    async fn test_disconnect_without_data() {
        let (addr, console) = start().await;

        let client = TcpStream::connect(addr).await.unwrap();
        let local = client.local_addr().unwrap();
        drop(client);

        wait_for(&console, &format!("close: {local}")).await;
        assert!(console.contains(&format!("accept: {local}")));
    }

    #[tokio::test]
    async fn test_concurrent_clients() {
        let (addr, console) = start().await;

        let clients: Vec<_> = (0..100)
            .map(|i| {
                tokio::spawn(async move {
                    let mut client = TcpStream::connect(addr).await.unwrap();
                    client
                        .write_all(format!("client-{i}").as_bytes())
                        .await
                        .unwrap();
                    let mut reply = Vec::new();
                    client.read_to_end(&mut reply).await.unwrap();
                    reply
                })
            })
            .collect();

        for client in clients {
            assert_eq!(client.await.unwrap(), b"hellohellohello");
        }

        for i in 0..100 {
            wait_for(&console, &format!("client-{i}")).await;
        }
    }

    #[tokio::test]
    async fn test_bind_in_use_fails() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let config = Config {
            listen: taken.local_addr().unwrap().to_string(),
            ..Config::default()
        };

        let result = Server::bind(&config, Arc::new(Recording::default())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_custom_reply() {
        let console = Arc::new(Recording::default());
        let config = Config {
            reply: "pong".to_string(),
            ..config()
        };
        let server = Server::bind(&config, console).await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        let mut client = TcpStream::connect(addr).await.unwrap();
        client.write_all(b"ping").await.unwrap();
        let mut reply = Vec::new();
        client.read_to_end(&mut reply).await.unwrap();
        assert_eq!(reply, b"pong");
    }
}
