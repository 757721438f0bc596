//! Message protocol definitions
//!
//! JSON-based bidirectional message protocol using Serde's adjacently
//! tagged enums. Every frame looks like `{"event": "...", "data": ...}`
//! with kebab-case event names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Client → Server message
///
/// Frames that do not match one of these shapes are dropped by the
/// connection handler before they reach the server.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Claim a username and enter the room
    Join(String),
    /// Send a public message to the room
    ChatMessage(ChatPayload),
    /// Send a private message to one user
    PrivateMessage(PrivatePayload),
    /// Report typing status
    Typing(TypingPayload),
}

/// Payload of an inbound `chat-message`
#[derive(Debug, Deserialize)]
pub struct ChatPayload {
    pub message: String,
}

/// Payload of an inbound `private-message`
#[derive(Debug, Deserialize)]
pub struct PrivatePayload {
    pub to: String,
    pub message: String,
}

/// Payload of an inbound `typing`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub is_typing: bool,
}

/// Server → Client message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Join rejected, carries the reason
    UsernameTaken(String),
    /// Roster sent to the joiner only
    UserList(Vec<String>),
    /// Recent public messages, oldest first, sent to the joiner only
    History(Vec<ChatMessage>),
    /// Refreshed roster sent to everyone
    UpdateUserList(Vec<String>),
    /// Public message
    ChatMessage(ChatMessage),
    /// Someone entered the room
    UserJoined(PresenceNotice),
    /// Someone left the room
    UserLeft(PresenceNotice),
    /// Someone started or stopped typing
    UserTyping(TypingNotice),
    /// Private message, delivered to target and sender
    PrivateMessage(PrivateMessage),
    /// Private message could not be delivered
    PrivateError(PrivateError),
}

/// A public chat message, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub username: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// A private message between two users; never stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateMessage {
    pub from: String,
    pub to: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Join/leave system notice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceNotice {
    pub username: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl PresenceNotice {
    pub fn joined(username: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            username: username.to_string(),
            message: format!("{} joined", username),
            timestamp,
        }
    }

    pub fn left(username: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            username: username.to_string(),
            message: format!("{} left", username),
            timestamp,
        }
    }
}

/// Typing status relayed to other users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingNotice {
    pub username: String,
    pub is_typing: bool,
}

/// Failure notice for an undeliverable private message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateError {
    pub message: String,
}
