//! scull Server Binary
//!
//! Loads the device and serves sessions over TCP.

use std::sync::Arc;

use clap::Parser;
use scull::network::Server;
use scull::{Config, Driver};
use tracing_subscriber::{fmt, EnvFilter};

/// scull Server
#[derive(Parser, Debug)]
#[command(name = "scull-server")]
#[command(about = "In-memory character device served over TCP")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7070")]
    listen: String,

    /// Maximum concurrent sessions
    #[arg(short, long, default_value = "64")]
    max_connections: usize,

    /// Idle session timeout in milliseconds (0 = never)
    #[arg(short = 't', long, default_value = "30000")]
    read_timeout_ms: u64,

    /// Interval at which blocked lock waits check for interruption (ms)
    #[arg(long, default_value = "10")]
    lock_poll_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,scull=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("scull server v{}", scull::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms)
        .lock_poll_interval_ms(args.lock_poll_ms)
        .build();

    let driver = match Driver::new(config.clone()) {
        Ok(d) => Arc::new(d),
        Err(e) => {
            tracing::error!("Failed to load device: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::new(config, driver) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", args.listen, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
