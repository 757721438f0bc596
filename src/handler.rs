//! WebSocket connection handler
//!
//! The gateway between sockets and the ChatServer: accepts connections,
//! decodes inbound frames into commands and writes outbound messages.
//! A connection's commands always end with exactly one `Disconnect`.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::message::{ClientMessage, ServerMessage};
use crate::server::ServerCommand;
use crate::types::ClientId;

type WsStream = WebSocketStream<TcpStream>;

/// Accept connections forever, spawning a handler task for each
pub async fn serve(listener: TcpListener, cmd_tx: mpsc::Sender<ServerCommand>) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                continue;
            }
        };
        debug!("New connection from {}", addr);

        let cmd_tx = cmd_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, cmd_tx).await {
                warn!("Connection from {} ended with error: {}", addr, e);
            }
        });
    }
}

/// Drive one connection from handshake to disconnect
///
/// Inbound frames are read on this task while a spawned writer drains
/// the client's outbound channel. When either side stops, the other is
/// cancelled before `Disconnect` is sent, so no command for this client
/// can reach the server after it.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
) -> Result<(), AppError> {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let (outbound, inbound) = tokio_tungstenite::accept_async(stream).await?.split();

    let client_id = ClientId::new();
    let (sender, inbox) = mpsc::unbounded_channel();
    cmd_tx
        .send(ServerCommand::Connect { client_id, sender })
        .await
        .map_err(|_| AppError::ChannelSend)?;
    info!("Client {} connected from {}", client_id, peer);

    let mut writer = tokio::spawn(write_outbound(client_id, outbound, inbox));

    tokio::select! {
        _ = read_inbound(client_id, inbound, &cmd_tx) => {}
        _ = &mut writer => {
            debug!("Writer for {} stopped first", client_id);
        }
    }
    writer.abort();

    let _ = cmd_tx.send(ServerCommand::Disconnect { client_id }).await;
    info!("Client {} disconnected", client_id);

    Ok(())
}

/// Forward decoded frames to the server until the socket or server goes away
async fn read_inbound(
    client_id: ClientId,
    mut inbound: SplitStream<WsStream>,
    cmd_tx: &mpsc::Sender<ServerCommand>,
) {
    while let Some(frame) = inbound.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => return,
            // Pings are answered by tungstenite; binary frames are not part of the protocol
            Ok(_) => continue,
            Err(e) => {
                warn!("Read error on {}: {}", client_id, e);
                return;
            }
        };

        let Some(cmd) = decode_command(client_id, &text) else {
            continue;
        };
        if cmd_tx.send(cmd).await.is_err() {
            debug!("ChatServer gone, {} stops reading", client_id);
            return;
        }
    }
}

/// Serialize queued messages onto the socket until the channel closes
async fn write_outbound(
    client_id: ClientId,
    mut outbound: SplitSink<WsStream, Message>,
    mut inbox: mpsc::UnboundedReceiver<ServerMessage>,
) {
    while let Some(msg) = inbox.recv().await {
        let json = match serde_json::to_string(&msg) {
            Ok(json) => json,
            Err(e) => {
                error!("Could not encode message for {}: {}", client_id, e);
                continue;
            }
        };
        if let Err(e) = outbound.send(Message::Text(json.into())).await {
            debug!("Write to {} failed: {}", client_id, e);
            return;
        }
    }
    let _ = outbound.close().await;
}

/// Decode a text frame into a command
///
/// Frames that are not valid `ClientMessage`s are logged and dropped.
fn decode_command(client_id: ClientId, text: &str) -> Option<ServerCommand> {
    let msg = match serde_json::from_str::<ClientMessage>(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Ignoring malformed frame from {}: {}", client_id, e);
            return None;
        }
    };

    let cmd = match msg {
        ClientMessage::Join(username) => ServerCommand::Join {
            client_id,
            username,
        },
        ClientMessage::ChatMessage(p) => ServerCommand::Chat {
            client_id,
            message: p.message,
        },
        ClientMessage::PrivateMessage(p) => ServerCommand::Private {
            client_id,
            to: p.to,
            message: p.message,
        },
        ClientMessage::Typing(p) => ServerCommand::Typing {
            client_id,
            is_typing: p.is_typing,
        },
    };
    Some(cmd)
}
