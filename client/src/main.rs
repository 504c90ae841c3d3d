//! rtunnel - Reverse Tunnel Client
//!
//! Maintains an outbound connection to a transit server so that a
//! server-side endpoint can reach a TCP service that is only locally
//! reachable from this client's network, without exposing any inbound
//! port. Transient network failures are survived by reconnecting with
//! a fixed backoff.

mod config;
mod tunnel;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "rtunnel")]
#[command(version)]
#[command(about = "Reverse tunnel client - exposes a local TCP service through a transit server", long_about = None)]
struct Args {
    /// Transit server host
    #[arg(long)]
    rtunnel_server_host: String,

    /// Transit server port
    #[arg(long)]
    rtunnel_server_port: u16,

    /// Host of the local TCP service to expose
    #[arg(long)]
    tcp_host: String,

    /// Port of the local TCP service to expose
    #[arg(long)]
    tcp_port: u16,

    /// Server-side port that exposes this service
    #[arg(long)]
    forward_port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Missing required options are a fatal startup error raised by clap.
    let args = Args::parse();
    let config = config::ClientConfig {
        rtunnel_server_host: args.rtunnel_server_host,
        rtunnel_server_port: args.rtunnel_server_port,
        tcp_host: args.tcp_host,
        tcp_port: args.tcp_port,
        forward_port: args.forward_port,
    };

    info!("rtunnel client v{}", env!("CARGO_PKG_VERSION"));
    info!("transit server: {}", config.server_endpoint());
    info!(
        "local service: {}:{} (forward_port={})",
        config.tcp_host, config.tcp_port, config.forward_port
    );

    let supervisor = Arc::new(tunnel::Supervisor::new(config));
    let runner = supervisor.clone();
    tokio::select! {
        _ = runner.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
            supervisor.stop().await;
        }
    }

    Ok(())
}
