//! Error types for the chat server
//!
//! Defines transport-level errors, domain outcomes of chat operations,
//! and message send errors. Uses thiserror for ergonomic error definitions.

use thiserror::Error;

use crate::message::{PrivateError, ServerMessage};
use crate::types::{MAX_MESSAGE_CHARS, MAX_USERNAME_CHARS};

/// Application-level errors
///
/// Fatal to the connection task (or to startup) that produced them,
/// never to the chat state.
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid process configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,
}

/// Configuration errors raised while reading the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    /// PORT is set but not a valid u16
    #[error("invalid PORT value '{0}'")]
    InvalidPort(String),
}

/// Domain outcomes of chat operations
///
/// Every variant is local to the originating connection. Some are
/// reported back to it, the rest are dropped silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// Join attempted with a blank or whitespace-only name
    #[error("Username must not be empty")]
    EmptyUsername,

    /// Join attempted with a name longer than the limit
    #[error("Username must be at most {max} characters", max = MAX_USERNAME_CHARS)]
    UsernameTooLong,

    /// Join attempted with a name held by a live session
    #[error("Username '{0}' is already taken, please choose another one")]
    UsernameTaken(String),

    /// Join attempted on a connection that already has a session
    #[error("Already joined as '{0}'")]
    AlreadyJoined(String),

    /// Chat operation attempted before joining
    #[error("Not joined")]
    NotJoined,

    /// Message body is empty after trimming
    #[error("Message body is empty")]
    EmptyBody,

    /// Message body exceeds the limit
    #[error("Message body exceeds {max} characters", max = MAX_MESSAGE_CHARS)]
    BodyTooLong,

    /// Private message without a recipient
    #[error("Private message target is empty")]
    EmptyTarget,

    /// Private message addressed to a username with no live session
    #[error("{0} not online or does not exist")]
    PrivateTargetNotFound(String),
}

impl ChatError {
    /// Convert to the notice sent back to the originating connection
    ///
    /// Returns `None` for outcomes that are dropped without feedback.
    pub fn notice(&self) -> Option<ServerMessage> {
        match self {
            ChatError::EmptyUsername
            | ChatError::UsernameTooLong
            | ChatError::UsernameTaken(_)
            | ChatError::AlreadyJoined(_) => Some(ServerMessage::UsernameTaken(self.to_string())),
            ChatError::PrivateTargetNotFound(_) => Some(ServerMessage::PrivateError(PrivateError {
                message: self.to_string(),
            })),
            ChatError::NotJoined
            | ChatError::EmptyBody
            | ChatError::BodyTooLong
            | ChatError::EmptyTarget => None,
        }
    }
}

/// Message send errors
///
/// Occurs when attempting to send messages through closed channels.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,
}
