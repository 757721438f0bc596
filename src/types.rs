//! Basic type definitions for the chat server
//!
//! Provides the `ClientId` newtype and the input limits shared by
//! the registry and the message router.

use uuid::Uuid;

/// Maximum username length, in characters
pub const MAX_USERNAME_CHARS: usize = 20;

/// Maximum message body length, in characters
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Unique client identifier (newtype pattern)
///
/// Wraps a UUID v4 for type-safe connection identification.
/// Implements Hash and Eq for use as HashMap keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    /// Create a new random client ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Length in characters, not bytes
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}
