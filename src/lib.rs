//! Shared-Room WebSocket Chat Server Library
//!
//! A single chat room with private messaging, built with tokio-tungstenite
//! using the Actor pattern for state management.
//!
//! # Features
//! - Unique usernames per live connection
//! - Public messages broadcast to everyone, with a 50-message history
//!   replayed to new joiners
//! - One-to-one private messages
//! - Join/leave notices and user list updates
//! - Typing indicators
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the session registry,
//!   history buffer and client channels
//! - Each connection has a `handler` task communicating with the server
//! - Presence, routing and typing logic reach connections only through
//!   the `Broadcaster` trait
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use chat_room::{serve, ChatServer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(ChatServer::new(cmd_rx).run());
//!     serve(listener, cmd_tx).await;
//! }
//! ```

pub mod broadcaster;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod history;
pub mod message;
pub mod presence;
pub mod registry;
pub mod router;
pub mod server;
pub mod time;
pub mod types;
pub mod typing;

// Re-export main types for convenience
pub use broadcaster::{Broadcaster, ClientHub};
pub use client::Client;
pub use config::ServerConfig;
pub use error::{AppError, ChatError, ConfigError, SendError};
pub use handler::{handle_connection, serve};
pub use history::HistoryBuffer;
pub use message::{ChatMessage, ClientMessage, PrivateMessage, ServerMessage};
pub use registry::{Session, SessionRegistry};
pub use server::{ChatServer, ServerCommand};
pub use types::ClientId;
