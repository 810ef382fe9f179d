//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::protocol::{CloseFrame, Message},
};
use tsuyaku_server::{
    domain::Language,
    infrastructure::dto::websocket::{InboundEvent, OutboundEvent},
};

use crate::error::ClientError;

use super::{formatter::MessageFormatter, ui::redisplay_prompt};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Who this client is in the room
#[derive(Debug, Clone)]
pub struct Identity {
    pub room_id: String,
    pub client_id: String,
    pub username: String,
    pub language: Language,
}

/// How one live session ended
#[derive(Debug)]
pub enum SessionEnd {
    UserQuit,
    Lost(ClientError),
}

/// Open the WebSocket handshake
pub async fn open(join_url: &str) -> Result<WsStream, ClientError> {
    let (ws_stream, _response) = connect_async(join_url)
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;
    Ok(ws_stream)
}

fn close_error(frame: Option<CloseFrame>, identity: &Identity) -> ClientError {
    match frame {
        Some(frame) => {
            ClientError::from_close(u16::from(frame.code), frame.reason.as_str(), &identity.client_id)
        }
        None => ClientError::ConnectionError("closed by server".to_string()),
    }
}

/// Print one relay frame for this reader
fn display(text: &str, identity: &Identity) {
    let formatted = match serde_json::from_str::<OutboundEvent>(text) {
        Ok(OutboundEvent::Message(payload)) => {
            Some(MessageFormatter::format_message(&payload, identity.language))
        }
        Ok(OutboundEvent::UserJoined(payload)) => {
            Some(MessageFormatter::format_user_joined(&payload))
        }
        Ok(OutboundEvent::UserLeft(payload)) => Some(MessageFormatter::format_user_left(&payload)),
        Ok(OutboundEvent::Typing(payload)) => MessageFormatter::format_typing(&payload),
        Err(e) => {
            tracing::debug!("Undecodable frame: {}", e);
            Some(MessageFormatter::format_raw_message(text))
        }
    };

    if let Some(formatted) = formatted {
        print!("{}", formatted);
        redisplay_prompt(&identity.username);
    }
}

/// Run a connected session until the user quits or the connection ends.
///
/// Each entered line is sent as a message, bracketed by typing start/stop.
pub async fn run_session(
    ws_stream: WsStream,
    identity: &Identity,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
) -> SessionEnd {
    tracing::info!("Connected to relay!");
    print!(
        "{}",
        MessageFormatter::format_welcome(&identity.username, &identity.room_id, identity.language)
    );
    redisplay_prompt(&identity.username);

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => display(text.as_str(), identity),
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!("Server closed the connection");
                    return SessionEnd::Lost(close_error(frame, identity));
                }
                // ping/pong is answered by the protocol layer
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return SessionEnd::Lost(ClientError::ConnectionError(e.to_string()));
                }
                None => {
                    return SessionEnd::Lost(ClientError::ConnectionError(
                        "Connection lost".to_string(),
                    ));
                }
            },
            line = input_rx.recv() => {
                let Some(line) = line else {
                    // prompt closed (Ctrl+C / Ctrl+D)
                    let _ = write.send(Message::Close(None)).await;
                    return SessionEnd::UserQuit;
                };

                let events = [
                    InboundEvent::Typing { is_typing: true },
                    InboundEvent::Message { text: line },
                    InboundEvent::Typing { is_typing: false },
                ];
                for event in events {
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::error!("Failed to serialize event: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = write.send(Message::Text(json.into())).await {
                        tracing::warn!("Failed to send message: {}", e);
                        return SessionEnd::Lost(ClientError::ConnectionError(e.to_string()));
                    }
                }
            }
        }
    }
}
