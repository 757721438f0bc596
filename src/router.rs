//! Public and private message routing
//!
//! Public messages go into the history buffer and out to every
//! connection, sender included. Private messages reach exactly the
//! target and the sender and are never stored.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::broadcaster::Broadcaster;
use crate::error::ChatError;
use crate::history::HistoryBuffer;
use crate::message::{ChatMessage, PrivateMessage, ServerMessage};
use crate::registry::{Session, SessionRegistry};
use crate::types::{char_len, MAX_MESSAGE_CHARS};

/// Trim a raw body and check it against the length limits
pub(crate) fn validate_body(raw_body: &str) -> Result<&str, ChatError> {
    let body = raw_body.trim();
    if body.is_empty() {
        return Err(ChatError::EmptyBody);
    }
    if char_len(body) > MAX_MESSAGE_CHARS {
        return Err(ChatError::BodyTooLong);
    }
    Ok(body)
}

/// Record a public message and broadcast it to every connection
///
/// Unauthenticated senders and empty or oversized bodies are dropped
/// without any delivery.
pub fn publish_public<B: Broadcaster>(
    history: &mut HistoryBuffer,
    out: &B,
    session: Option<&Session>,
    raw_body: &str,
    now: DateTime<Utc>,
) -> Result<ChatMessage, ChatError> {
    let session = session.ok_or(ChatError::NotJoined)?;
    let body = validate_body(raw_body)?;

    let message = ChatMessage {
        username: session.username.clone(),
        message: body.to_string(),
        timestamp: now,
    };
    history.append(message.clone());
    out.to_all(ServerMessage::ChatMessage(message.clone()));

    debug!("{}: {}", session.username, message.message);
    Ok(message)
}

/// Deliver a private message to `target_username` and echo it to the sender
///
/// An unknown target yields a `private-error` to the sender only.
pub fn send_private<B: Broadcaster>(
    registry: &SessionRegistry,
    out: &B,
    session: Option<&Session>,
    target_username: &str,
    raw_body: &str,
    now: DateTime<Utc>,
) -> Result<PrivateMessage, ChatError> {
    let session = session.ok_or(ChatError::NotJoined)?;
    let target_username = target_username.trim();
    if target_username.is_empty() {
        return Err(ChatError::EmptyTarget);
    }
    let body = validate_body(raw_body)?;

    let Some(target) = registry.find_by_username(target_username) else {
        let err = ChatError::PrivateTargetNotFound(target_username.to_string());
        out.report(session.connection_id, &err);
        return Err(err);
    };

    let message = PrivateMessage {
        from: session.username.clone(),
        to: target.username.clone(),
        message: body.to_string(),
        timestamp: now,
    };

    out.to_one(target.connection_id, ServerMessage::PrivateMessage(message.clone()));
    // Messaging yourself delivers once
    if target.connection_id != session.connection_id {
        out.to_one(
            session.connection_id,
            ServerMessage::PrivateMessage(message.clone()),
        );
    }

    debug!("{} -> {} (private)", message.from, message.to);
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcaster::testing::RecordingBroadcaster;
    use crate::message::PrivateError;

    struct Fixture {
        registry: SessionRegistry,
        history: HistoryBuffer,
        out: RecordingBroadcaster,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: SessionRegistry::new(),
                history: HistoryBuffer::new(),
                out: RecordingBroadcaster::new(),
            }
        }

        fn join(&mut self, name: &str) -> Session {
            let id = self.out.connect();
            self.registry.join(id, name, Utc::now()).unwrap()
        }
    }

    #[test]
    fn test_public_message_reaches_everyone_including_sender() {
        let mut fx = Fixture::new();
        let alice = fx.join("alice");
        let bob = fx.join("bob");
        let anonymous = fx.out.connect();

        let msg = publish_public(&mut fx.history, &fx.out, Some(&alice), "  hello ", Utc::now())
            .unwrap();

        assert_eq!(msg.message, "hello");
        for id in [alice.connection_id, bob.connection_id, anonymous] {
            assert_eq!(fx.out.received(id), vec![ServerMessage::ChatMessage(msg.clone())]);
        }
        assert_eq!(fx.history.snapshot(), vec![msg]);
    }

    #[test]
    fn test_public_message_dropped_silently() {
        let mut fx = Fixture::new();
        let alice = fx.join("alice");

        assert_eq!(
            publish_public(&mut fx.history, &fx.out, None, "hi", Utc::now()),
            Err(ChatError::NotJoined)
        );
        assert_eq!(
            publish_public(&mut fx.history, &fx.out, Some(&alice), "   ", Utc::now()),
            Err(ChatError::EmptyBody)
        );
        let long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        assert_eq!(
            publish_public(&mut fx.history, &fx.out, Some(&alice), &long, Utc::now()),
            Err(ChatError::BodyTooLong)
        );

        assert_eq!(fx.out.total(), 0);
        assert!(fx.history.is_empty());
    }

    #[test]
    fn test_sixty_messages_keep_last_fifty() {
        let mut fx = Fixture::new();
        let alice = fx.join("alice");

        for n in 1..=60 {
            let body = format!("message {}", n);
            publish_public(&mut fx.history, &fx.out, Some(&alice), &body, Utc::now()).unwrap();
        }

        let snapshot = fx.history.snapshot();
        assert_eq!(snapshot.len(), 50);
        assert_eq!(snapshot[0].message, "message 11");
    }

    #[test]
    fn test_private_message_reaches_target_and_sender_only() {
        let mut fx = Fixture::new();
        let alice = fx.join("alice");
        let bob = fx.join("bob");
        let carol = fx.join("carol");

        let msg = send_private(&fx.registry, &fx.out, Some(&alice), "bob", "psst", Utc::now())
            .unwrap();

        assert_eq!(msg.from, "alice");
        assert_eq!(msg.to, "bob");
        let expected = vec![ServerMessage::PrivateMessage(msg)];
        assert_eq!(fx.out.received(bob.connection_id), expected);
        assert_eq!(fx.out.received(alice.connection_id), expected);
        assert!(fx.out.received(carol.connection_id).is_empty());
        assert!(fx.history.is_empty());
    }

    #[test]
    fn test_private_message_to_unknown_target() {
        let mut fx = Fixture::new();
        let alice = fx.join("alice");
        let bob = fx.join("bob");

        let result = send_private(&fx.registry, &fx.out, Some(&alice), "carol", "hi", Utc::now());

        assert_eq!(
            result,
            Err(ChatError::PrivateTargetNotFound("carol".to_string()))
        );
        assert_eq!(
            fx.out.received(alice.connection_id),
            vec![ServerMessage::PrivateError(PrivateError {
                message: "carol not online or does not exist".to_string()
            })]
        );
        assert!(fx.out.received(bob.connection_id).is_empty());
    }

    #[test]
    fn test_private_message_to_self_delivered_once() {
        let mut fx = Fixture::new();
        let alice = fx.join("alice");

        send_private(&fx.registry, &fx.out, Some(&alice), "alice", "note", Utc::now()).unwrap();

        assert_eq!(fx.out.received(alice.connection_id).len(), 1);
    }

    #[test]
    fn test_private_message_dropped_silently() {
        let mut fx = Fixture::new();
        let alice = fx.join("alice");
        fx.join("bob");

        assert_eq!(
            send_private(&fx.registry, &fx.out, None, "bob", "hi", Utc::now()),
            Err(ChatError::NotJoined)
        );
        assert_eq!(
            send_private(&fx.registry, &fx.out, Some(&alice), "", "hi", Utc::now()),
            Err(ChatError::EmptyTarget)
        );
        assert_eq!(
            send_private(&fx.registry, &fx.out, Some(&alice), "bob", " \n", Utc::now()),
            Err(ChatError::EmptyBody)
        );
        assert_eq!(fx.out.total(), 0);
    }

    #[test]
    fn test_private_target_is_trimmed() {
        let mut fx = Fixture::new();
        let alice = fx.join("alice");
        let bob = fx.join("bob");

        assert_eq!(
            send_private(&fx.registry, &fx.out, Some(&alice), "   ", "hi", Utc::now()),
            Err(ChatError::EmptyTarget)
        );
        assert_eq!(fx.out.total(), 0);

        let msg = send_private(&fx.registry, &fx.out, Some(&alice), " bob ", "hi", Utc::now())
            .unwrap();
        assert_eq!(msg.to, "bob");
        assert_eq!(fx.out.received(bob.connection_id).len(), 1);
    }
}
