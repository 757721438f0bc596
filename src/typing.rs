//! Typing status relay
//!
//! Stateless: the server neither tracks nor times out typing status,
//! the client is expected to send `isTyping: false` itself.

use crate::broadcaster::Broadcaster;
use crate::message::{ServerMessage, TypingNotice};
use crate::registry::Session;

/// Relay a typing signal to everyone but the sender
pub fn on_typing<B: Broadcaster>(out: &B, session: Option<&Session>, is_typing: bool) {
    let Some(session) = session else {
        return;
    };

    out.to_all_except(
        session.connection_id,
        ServerMessage::UserTyping(TypingNotice {
            username: session.username.clone(),
            is_typing,
        }),
    );
}
