//! Relay server binary
//!
//! Run with: whisp-relay [--bind ADDR] [--max-connections N] [--queue-capacity N]
//!
//! ## Create a channel
//!
//!   curl -X POST localhost:3000/channel -d '{"password":"secret"}' \
//!        -H 'content-type: application/json'
//!
//! ## Join it
//!
//!   websocat 'ws://localhost:3000/channel/<channel_id>?password=secret'

use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use whisp_relay::server::config::DEFAULT_PORT;
use whisp_relay::{RegistryConfig, RelayServer, ServerConfig};

/// Password-protected WebSocket channel relay
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Address to listen on (`localhost` or `host:port`)
    #[arg(long, env = "WHISP_BIND", default_value = "127.0.0.1:3000", value_parser = parse_bind_addr)]
    bind: SocketAddr,

    /// Maximum concurrent sessions (0 = unlimited)
    #[arg(long, env = "WHISP_MAX_CONNECTIONS", default_value_t = 0)]
    max_connections: usize,

    /// Frames queued per member before deliveries to it are dropped
    #[arg(long, env = "WHISP_QUEUE_CAPACITY", default_value_t = whisp_relay::registry::config::DEFAULT_MEMBER_QUEUE_CAPACITY)]
    queue_capacity: usize,
}

fn parse_bind_addr(s: &str) -> Result<SocketAddr, String> {
    if s == "localhost" {
        return Ok(SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)));
    }

    if let Ok(addr) = s.parse() {
        return Ok(addr);
    }

    if let Ok(ip) = s.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "invalid address '{}': expected 'localhost', an IP, or IP:PORT",
        s
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("whisp_relay=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    let config = ServerConfig::with_addr(args.bind).max_connections(args.max_connections);
    let registry_config = RegistryConfig::default().member_queue_capacity(args.queue_capacity);
    let server = RelayServer::with_registry_config(config, registry_config);

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    Ok(())
}
