//! Session registry
//!
//! Maps live connections to usernames and back. Name uniqueness is
//! enforced here at join time; the two indices are only mutated
//! together, through `join` and `remove`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::ChatError;
use crate::types::{char_len, ClientId, MAX_USERNAME_CHARS};

/// Live binding between a connection and a username
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub connection_id: ClientId,
    pub username: String,
    pub joined_at: DateTime<Utc>,
}

/// Registry of authenticated connections
#[derive(Debug, Default)]
pub struct SessionRegistry {
    /// ClientId -> Session
    sessions: HashMap<ClientId, Session>,
    /// Username -> ClientId, for private message lookup
    by_username: HashMap<String, ClientId>,
    /// Join order, drives the user list
    order: Vec<ClientId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `requested_name` to `connection_id`
    ///
    /// The name is trimmed first. A failed join leaves the registry untouched.
    pub fn join(
        &mut self,
        connection_id: ClientId,
        requested_name: &str,
        joined_at: DateTime<Utc>,
    ) -> Result<Session, ChatError> {
        let username = requested_name.trim();

        if username.is_empty() {
            return Err(ChatError::EmptyUsername);
        }
        if char_len(username) > MAX_USERNAME_CHARS {
            return Err(ChatError::UsernameTooLong);
        }
        if let Some(existing) = self.sessions.get(&connection_id) {
            return Err(ChatError::AlreadyJoined(existing.username.clone()));
        }
        if self.by_username.contains_key(username) {
            return Err(ChatError::UsernameTaken(username.to_string()));
        }

        let session = Session {
            connection_id,
            username: username.to_string(),
            joined_at,
        };
        self.by_username
            .insert(session.username.clone(), connection_id);
        self.sessions.insert(connection_id, session.clone());
        self.order.push(connection_id);

        Ok(session)
    }

    /// Remove the session bound to `connection_id`, if any
    pub fn remove(&mut self, connection_id: ClientId) -> Option<Session> {
        let session = self.sessions.remove(&connection_id)?;
        self.by_username.remove(&session.username);
        self.order.retain(|id| *id != connection_id);
        Some(session)
    }

    pub fn get(&self, connection_id: ClientId) -> Option<&Session> {
        self.sessions.get(&connection_id)
    }

    /// Exact, case-sensitive lookup
    pub fn find_by_username(&self, name: &str) -> Option<&Session> {
        self.by_username
            .get(name)
            .and_then(|id| self.sessions.get(id))
    }

    /// Usernames of all live sessions in join order
    pub fn list_usernames(&self) -> Vec<String> {
        self.order
            .iter()
            .filter_map(|id| self.sessions.get(id))
            .map(|s| s.username.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
