//! WebSocket connection handlers.
//!
//! The handshake is validated after the upgrade so a rejected client receives a
//! close frame with a specific code instead of a bare HTTP status:
//!
//! - `4400`: invalid join request (room id, client id, language or username)
//! - `4409`: client id already joined

use std::sync::Arc;

use axum::{
    extract::{
        Path, Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ClientId, ConnectionEvent, ConnectionState, MAX_MESSAGE_LENGTH},
    infrastructure::dto::websocket::InboundEvent,
    ui::state::AppState,
    usecase::{ConnectError, JoinRequest, SendMessageError},
};

pub const CLOSE_INVALID_JOIN_REQUEST: u16 = 4400;
pub const CLOSE_ALREADY_JOINED: u16 = 4409;

/// Query parameters for WebSocket connection
///
/// Missing parameters decode as empty strings and are rejected by validation.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub username: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    let request = JoinRequest {
        room_id,
        client_id: query.client_id,
        language: query.language,
        username: query.username,
    };
    ws.on_upgrade(move |socket| handle_socket(socket, state, request))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// The task ends when the channel is dropped (client unregistered) or the socket write fails.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    })
}

/// Close the socket with an application close code, sending nothing else.
async fn reject(mut socket: WebSocket, code: u16, reason: String) {
    let frame = CloseFrame {
        code,
        reason: reason.into(),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        tracing::debug!("Failed to send close frame: {}", e);
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, request: JoinRequest) {
    let mut connection = ConnectionState::Connecting;
    let (tx, rx) = mpsc::unbounded_channel();

    let client = match state
        .connect_participant_usecase
        .execute(request.clone(), tx)
        .await
    {
        Ok(client) => {
            connection = connection.next(ConnectionEvent::HandshakeAccepted);
            client
        }
        Err(e) => {
            connection = connection.next(ConnectionEvent::HandshakeRejected);
            let code = match &e {
                ConnectError::InvalidJoinRequest(_) => CLOSE_INVALID_JOIN_REQUEST,
                ConnectError::AlreadyJoined(_) => CLOSE_ALREADY_JOINED,
            };
            tracing::warn!(
                "Rejected connection for client '{}' in room '{}' ({:?}): {}",
                request.client_id,
                request.room_id,
                connection,
                e
            );
            reject(socket, code, e.to_string()).await;
            return;
        }
    };

    let (sender, mut receiver) = socket.split();
    let client_id = client.id.clone();
    let state_for_recv = state.clone();
    let client_id_for_recv = client_id.clone();

    // Inbound: this client's frames
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error for '{}': {}", client_id_for_recv, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    connection = handle_inbound(
                        &state_for_recv,
                        &client_id_for_recv,
                        connection,
                        text.as_str(),
                    )
                    .await;
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", client_id_for_recv);
                    break;
                }
                // ping/pong is answered by the protocol layer
                _ => {}
            }
        }
        connection
    });

    // Outbound: events pushed to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    let last = tokio::select! {
        result = &mut recv_task => {
            send_task.abort();
            result.unwrap_or(ConnectionState::Connected)
        }
        _ = &mut send_task => {
            recv_task.abort();
            ConnectionState::Connected
        }
    };
    if last.is_typing() {
        tracing::debug!("Client '{}' disconnected while typing", client_id);
    }
    let connection = last.next(ConnectionEvent::Closed);
    tracing::debug!("Client '{}' is {:?}", client_id, connection);

    // Every exit path ends here; leave is idempotent so user_left goes out once
    if state
        .disconnect_participant_usecase
        .execute(&client_id)
        .await
        .is_none()
    {
        tracing::debug!("Client '{}' was already removed", client_id);
    }
}

/// Decode and dispatch one inbound frame, returning the next connection state.
async fn handle_inbound(
    state: &AppState,
    client_id: &ClientId,
    connection: ConnectionState,
    text: &str,
) -> ConnectionState {
    if !connection.accepts_events() {
        return connection;
    }

    let event = match serde_json::from_str::<InboundEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Skipping undecodable frame from '{}': {}", client_id, e);
            return connection;
        }
    };

    match event {
        InboundEvent::Message { text } => {
            match state.send_message_usecase.execute(client_id, text).await {
                Ok(_) => connection.next(ConnectionEvent::MessageSent),
                Err(SendMessageError::EmptyMessage) => {
                    tracing::debug!("Ignoring blank message from '{}'", client_id);
                    connection
                }
                Err(SendMessageError::MessageTooLong(_)) => {
                    tracing::warn!(
                        "Dropping message from '{}' longer than {} characters",
                        client_id,
                        MAX_MESSAGE_LENGTH
                    );
                    connection
                }
                Err(e) => {
                    tracing::warn!("Failed to send message from '{}': {}", client_id, e);
                    connection
                }
            }
        }
        InboundEvent::Typing { is_typing } => {
            let next = connection.next(ConnectionEvent::Typing(is_typing));
            if let Err(e) = state
                .send_typing_usecase
                .execute(client_id, is_typing)
                .await
            {
                tracing::warn!("Failed to send typing from '{}': {}", client_id, e);
            }
            next
        }
    }
}
