use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use server::{Server, ServerConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "horde-server", version, about = "Horde world relay")]
struct Cli {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8765")]
    bind: SocketAddr,
    /// Milliseconds between world broadcasts.
    #[arg(long, default_value_t = 50, value_parser = clap::value_parser!(u64).range(1..))]
    broadcast_ms: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();

    let config = ServerConfig {
        bind: cli.bind,
        broadcast_interval: Duration::from_millis(cli.broadcast_ms),
        ..ServerConfig::default()
    };
    let server = Server::bind(config).context("start relay")?;
    server.run().context("relay stopped")?;
    Ok(())
}
