//! Join and leave handling
//!
//! Keeps every client's roster converged: after a join or a leave
//! completes, all connections have received the same user list.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::broadcaster::Broadcaster;
use crate::error::ChatError;
use crate::history::HistoryBuffer;
use crate::message::{PresenceNotice, ServerMessage};
use crate::registry::{Session, SessionRegistry};
use crate::types::ClientId;

/// Handle a `join` request
///
/// On failure only the requester hears about it. On success the others
/// get a `user-joined` notice, the joiner gets the roster and history,
/// then everyone gets the refreshed roster.
pub fn on_join<B: Broadcaster>(
    registry: &mut SessionRegistry,
    history: &HistoryBuffer,
    out: &B,
    connection_id: ClientId,
    requested_name: &str,
    now: DateTime<Utc>,
) -> Result<Session, ChatError> {
    let session = match registry.join(connection_id, requested_name, now) {
        Ok(session) => session,
        Err(err) => {
            out.report(connection_id, &err);
            return Err(err);
        }
    };

    out.to_all_except(
        connection_id,
        ServerMessage::UserJoined(PresenceNotice::joined(&session.username, now)),
    );

    let users = registry.list_usernames();
    out.to_one(connection_id, ServerMessage::UserList(users.clone()));
    out.to_one(connection_id, ServerMessage::History(history.snapshot()));
    out.to_all(ServerMessage::UpdateUserList(users));

    info!(
        "{} joined ({} online)",
        session.username,
        registry.len()
    );
    Ok(session)
}

/// Handle a connection going away
///
/// Only a connection that had joined produces deliveries; repeated
/// calls are no-ops.
pub fn on_disconnect<B: Broadcaster>(
    registry: &mut SessionRegistry,
    out: &B,
    connection_id: ClientId,
    now: DateTime<Utc>,
) -> Option<Session> {
    let session = registry.remove(connection_id)?;

    out.to_all_except(
        connection_id,
        ServerMessage::UserLeft(PresenceNotice::left(&session.username, now)),
    );
    out.to_all(ServerMessage::UpdateUserList(registry.list_usernames()));

    info!("{} left ({} online)", session.username, registry.len());
    Some(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcaster::testing::RecordingBroadcaster;
    use crate::message::ChatMessage;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_two_users_join() {
        let mut registry = SessionRegistry::new();
        let history = HistoryBuffer::new();
        let out = RecordingBroadcaster::new();
        let now = Utc::now();
        let a = out.connect();
        let b = out.connect();

        on_join(&mut registry, &history, &out, a, "alice", now).unwrap();
        out.clear();
        on_join(&mut registry, &history, &out, b, "bob", now).unwrap();

        assert_eq!(
            out.received(a),
            vec![
                ServerMessage::UserJoined(PresenceNotice::joined("bob", now)),
                ServerMessage::UpdateUserList(names(&["alice", "bob"])),
            ]
        );
        assert_eq!(
            out.received(b),
            vec![
                ServerMessage::UserList(names(&["alice", "bob"])),
                ServerMessage::History(vec![]),
                ServerMessage::UpdateUserList(names(&["alice", "bob"])),
            ]
        );
    }

    #[test]
    fn test_joiner_receives_history() {
        let mut registry = SessionRegistry::new();
        let mut history = HistoryBuffer::new();
        let out = RecordingBroadcaster::new();
        let earlier = ChatMessage {
            username: "alice".to_string(),
            message: "hello".to_string(),
            timestamp: Utc::now(),
        };
        history.append(earlier.clone());
        let b = out.connect();

        on_join(&mut registry, &history, &out, b, "bob", Utc::now()).unwrap();

        assert!(out
            .received(b)
            .contains(&ServerMessage::History(vec![earlier])));
    }

    #[test]
    fn test_taken_name_only_notifies_requester() {
        let mut registry = SessionRegistry::new();
        let history = HistoryBuffer::new();
        let out = RecordingBroadcaster::new();
        let (a, b, c) = (out.connect(), out.connect(), out.connect());
        on_join(&mut registry, &history, &out, a, "alice", Utc::now()).unwrap();
        on_join(&mut registry, &history, &out, b, "bob", Utc::now()).unwrap();
        out.clear();

        let result = on_join(&mut registry, &history, &out, c, "alice", Utc::now());

        assert!(matches!(result, Err(ChatError::UsernameTaken(_))));
        assert_eq!(registry.len(), 2);
        assert!(matches!(
            out.received(c).as_slice(),
            [ServerMessage::UsernameTaken(_)]
        ));
        assert!(out.received(a).is_empty());
        assert!(out.received(b).is_empty());
    }

    #[test]
    fn test_empty_name_reported_as_username_taken() {
        let mut registry = SessionRegistry::new();
        let history = HistoryBuffer::new();
        let out = RecordingBroadcaster::new();
        let a = out.connect();

        let result = on_join(&mut registry, &history, &out, a, "   ", Utc::now());

        assert_eq!(result, Err(ChatError::EmptyUsername));
        assert!(matches!(
            out.received(a).as_slice(),
            [ServerMessage::UsernameTaken(_)]
        ));
    }

    #[test]
    fn test_disconnect_notifies_others() {
        let mut registry = SessionRegistry::new();
        let history = HistoryBuffer::new();
        let out = RecordingBroadcaster::new();
        let now = Utc::now();
        let (a, b) = (out.connect(), out.connect());
        on_join(&mut registry, &history, &out, a, "alice", now).unwrap();
        on_join(&mut registry, &history, &out, b, "bob", now).unwrap();
        out.clear();
        out.disconnect(a);

        let removed = on_disconnect(&mut registry, &out, a, now);

        assert_eq!(removed.map(|s| s.username), Some("alice".to_string()));
        assert_eq!(
            out.received(b),
            vec![
                ServerMessage::UserLeft(PresenceNotice::left("alice", now)),
                ServerMessage::UpdateUserList(names(&["bob"])),
            ]
        );
    }

    #[test]
    fn test_disconnect_twice_broadcasts_once() {
        let mut registry = SessionRegistry::new();
        let history = HistoryBuffer::new();
        let out = RecordingBroadcaster::new();
        let (a, b) = (out.connect(), out.connect());
        on_join(&mut registry, &history, &out, a, "alice", Utc::now()).unwrap();
        out.clear();

        assert!(on_disconnect(&mut registry, &out, a, Utc::now()).is_some());
        assert!(on_disconnect(&mut registry, &out, a, Utc::now()).is_none());

        let left: Vec<_> = out
            .received(b)
            .into_iter()
            .filter(|m| matches!(m, ServerMessage::UserLeft(_)))
            .collect();
        assert_eq!(left.len(), 1);
    }

    #[test]
    fn test_disconnect_without_join_is_silent() {
        let mut registry = SessionRegistry::new();
        let out = RecordingBroadcaster::new();
        let a = out.connect();
        out.connect();

        assert!(on_disconnect(&mut registry, &out, a, Utc::now()).is_none());
        assert_eq!(out.total(), 0);
    }
}
