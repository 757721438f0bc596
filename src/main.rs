//! Chat Room Server - Entry Point
//!
//! Starts the TCP listener and ChatServer actor, accepting connections.

use std::env;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chat_room::config::{ServerConfig, CHANNEL_BUFFER_SIZE};
use chat_room::{serve, AppError, ChatServer};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_room=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_room=info")),
        )
        .init();

    // A bind address on the command line overrides HOST/PORT
    let addr = match env::args().nth(1) {
        Some(addr) => addr,
        None => ServerConfig::from_env()?.bind_addr(),
    };

    let listener = TcpListener::bind(&addr).await?;
    info!("Chat server listening on ws://{}", addr);

    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    tokio::spawn(ChatServer::new(cmd_rx).run());

    info!("ChatServer actor started");

    serve(listener, cmd_tx).await;
    Ok(())
}
