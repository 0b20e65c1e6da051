use reply_server::config::Config;
use reply_server::console::Stdout;
use reply_server::server::Server;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging. Stdout carries the connection transcript.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!(
        listen = %config.listen,
        buffer_size = config.buffer_size,
        reply_len = config.reply.len(),
        workers = ?config.workers,
        "Starting reply-server"
    );

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    if let Some(workers) = config.workers {
        builder.worker_threads(workers);
    }
    let runtime = builder.enable_all().build()?;

    runtime.block_on(async {
        let server = Server::bind(&config, Arc::new(Stdout)).await?;
        server.run().await;
        Ok::<_, std::io::Error>(())
    })?;

    Ok(())
}
