//! ChatServer Actor implementation
//!
//! The central actor that owns all chat state: connected clients, the
//! session registry and the history buffer. Every inbound event is a
//! `ServerCommand` processed to completion before the next one.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::broadcaster::ClientHub;
use crate::history::HistoryBuffer;
use crate::message::ServerMessage;
use crate::registry::SessionRegistry;
use crate::time::{Clock, SystemClock};
use crate::types::ClientId;
use crate::{presence, router, typing};

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New connection, not yet joined
    Connect {
        client_id: ClientId,
        sender: mpsc::UnboundedSender<ServerMessage>,
    },
    /// Connection closed
    Disconnect { client_id: ClientId },
    /// Claim a username
    Join {
        client_id: ClientId,
        username: String,
    },
    /// Public message
    Chat {
        client_id: ClientId,
        message: String,
    },
    /// Private message
    Private {
        client_id: ClientId,
        to: String,
        message: String,
    },
    /// Typing status change
    Typing { client_id: ClientId, is_typing: bool },
}

/// The main ChatServer actor
pub struct ChatServer {
    /// All live connections and their outbound channels
    clients: ClientHub,
    /// Joined connections
    registry: SessionRegistry,
    /// Recent public messages
    history: HistoryBuffer,
    clock: Arc<dyn Clock>,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        Self::with_clock(receiver, Arc::new(SystemClock))
    }

    pub fn with_clock(receiver: mpsc::Receiver<ServerCommand>, clock: Arc<dyn Clock>) -> Self {
        Self {
            clients: ClientHub::new(),
            registry: SessionRegistry::new(),
            history: HistoryBuffer::new(),
            clock,
            receiver,
        }
    }

    /// Run the ChatServer event loop
    ///
    /// Continuously receives and processes commands until all senders are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    pub(crate) fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect { client_id, sender } => {
                self.handle_connect(client_id, sender);
            }
            ServerCommand::Disconnect { client_id } => {
                self.handle_disconnect(client_id);
            }
            ServerCommand::Join {
                client_id,
                username,
            } => {
                self.handle_join(client_id, &username);
            }
            ServerCommand::Chat { client_id, message } => {
                self.handle_chat(client_id, &message);
            }
            ServerCommand::Private {
                client_id,
                to,
                message,
            } => {
                self.handle_private(client_id, &to, &message);
            }
            ServerCommand::Typing {
                client_id,
                is_typing,
            } => {
                typing::on_typing(&self.clients, self.registry.get(client_id), is_typing);
            }
        }
    }

    /// Handle new client connection
    fn handle_connect(&mut self, client_id: ClientId, sender: mpsc::UnboundedSender<ServerMessage>) {
        debug!("Client {} connected", client_id);
        self.clients.register(client_id, sender);
        debug!(
            "Total clients: {}, Total sessions: {}",
            self.clients.len(),
            self.registry.len()
        );
    }

    /// Handle client disconnection
    ///
    /// The client's channel is dropped first so the leave notices only
    /// reach the connections that remain.
    fn handle_disconnect(&mut self, client_id: ClientId) {
        self.clients.unregister(client_id);
        let now = self.clock.now();
        presence::on_disconnect(&mut self.registry, &self.clients, client_id, now);

        debug!(
            "Total clients: {}, Total sessions: {}",
            self.clients.len(),
            self.registry.len()
        );
    }

    /// Handle a join request
    ///
    /// Only connections still registered in the hub may join, otherwise a
    /// join racing its own disconnect would leave a session nothing removes.
    fn handle_join(&mut self, client_id: ClientId, username: &str) {
        if !self.clients.contains(client_id) {
            warn!("Join from unknown client {} ignored", client_id);
            return;
        }
        let now = self.clock.now();
        if let Err(e) = presence::on_join(
            &mut self.registry,
            &self.history,
            &self.clients,
            client_id,
            username,
            now,
        ) {
            info!("Client {} join rejected: {}", client_id, e);
        }
    }

    fn handle_chat(&mut self, client_id: ClientId, message: &str) {
        let now = self.clock.now();
        let session = self.registry.get(client_id);
        if let Err(e) = router::publish_public(&mut self.history, &self.clients, session, message, now)
        {
            debug!("Public message from {} dropped: {}", client_id, e);
        }
    }

    fn handle_private(&mut self, client_id: ClientId, to: &str, message: &str) {
        let now = self.clock.now();
        let session = self.registry.get(client_id);
        if let Err(e) = router::send_private(&self.registry, &self.clients, session, to, message, now)
        {
            debug!("Private message from {} not delivered: {}", client_id, e);
        }
    }
}
