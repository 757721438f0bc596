//! Outbound delivery
//!
//! `Broadcaster` is the only way the chat components reach connections.
//! `ClientHub` implements it over the per-connection channels held by
//! the server actor.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::debug;

use crate::client::Client;
use crate::error::ChatError;
use crate::message::ServerMessage;
use crate::types::ClientId;

/// Delivery primitives offered to the chat components
pub trait Broadcaster {
    /// Deliver to a single connection
    fn to_one(&self, client_id: ClientId, msg: ServerMessage);

    /// Deliver to every connection
    fn to_all(&self, msg: ServerMessage);

    /// Deliver to every connection except `excluded`
    fn to_all_except(&self, excluded: ClientId, msg: ServerMessage);

    /// Send the notice for `err`, if it has one, back to `client_id`
    fn report(&self, client_id: ClientId, err: &ChatError) {
        if let Some(notice) = err.notice() {
            self.to_one(client_id, notice);
        }
    }
}

/// All live connections, joined or not
#[derive(Debug, Default)]
pub struct ClientHub {
    clients: HashMap<ClientId, Client>,
}

impl ClientHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection's outbound channel
    pub fn register(&mut self, client_id: ClientId, sender: mpsc::UnboundedSender<ServerMessage>) {
        self.clients.insert(client_id, Client::new(client_id, sender));
    }

    /// Drop a connection's outbound channel; no-op if already gone
    pub fn unregister(&mut self, client_id: ClientId) -> Option<Client> {
        self.clients.remove(&client_id)
    }

    pub fn contains(&self, client_id: ClientId) -> bool {
        self.clients.contains_key(&client_id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    fn push(client: &Client, msg: ServerMessage) {
        // A closed channel means the client is going away; its own
        // disconnect command will clean it up.
        if client.send(msg).is_err() {
            debug!("Dropping message for closed client {}", client.id);
        }
    }
}

impl Broadcaster for ClientHub {
    fn to_one(&self, client_id: ClientId, msg: ServerMessage) {
        match self.clients.get(&client_id) {
            Some(client) => Self::push(client, msg),
            None => debug!("Client {} not connected, message dropped", client_id),
        }
    }

    fn to_all(&self, msg: ServerMessage) {
        for client in self.clients.values() {
            Self::push(client, msg.clone());
        }
    }

    fn to_all_except(&self, excluded: ClientId, msg: ServerMessage) {
        for client in self.clients.values().filter(|c| c.id != excluded) {
            Self::push(client, msg.clone());
        }
    }
}
