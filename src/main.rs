//! Letterbox Relay - serve the daily Letter Boxed puzzle data
//!
//! Fetches the puzzle page on the first request of each New York day, pulls
//! out the embedded game data, and answers every other request that day from
//! memory.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use letterbox_relay::cli::{Cli, ServerConfig};
use letterbox_relay::server;
use letterbox_relay::service::PuzzleService;
use letterbox_relay::source::PuzzleClient;

/// Initializes console logging; `RUST_LOG` overrides the default `info` level
fn init_logging() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse CLI arguments first so --help and --version exit before any setup
    let cli = Cli::parse();
    let config = ServerConfig::from_cli(&cli)?;

    init_logging();

    let client = PuzzleClient::new(&config.source)?;
    let service = Arc::new(PuzzleService::new(client, config.validation));
    let app = server::router(service, config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(
        addr = %local_addr,
        source = %config.source.url,
        "Server running"
    );

    axum::serve(listener, app).await?;

    Ok(())
}
