//! Client execution logic with reconnection support.

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;
use tsuyaku_server::domain::Language;

use super::{
    domain::{Backoff, ClientEvent, ClientState, ExitReason},
    error::ClientError,
    room::{create_room, join_url},
    session::{self, Identity, SessionEnd},
    ui::prompt,
};

/// Everything the client needs to join
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Relay base URL, e.g. `ws://127.0.0.1:8000`
    pub url: String,
    /// Room to join; a new one is created when absent
    pub room_id: Option<String>,
    pub client_id: String,
    pub username: String,
    pub language: Language,
}

/// Read lines on a blocking thread (rustyline is synchronous).
///
/// The channel closes when the user presses Ctrl+C or Ctrl+D.
fn spawn_readline(prompt: String, input_tx: mpsc::UnboundedSender<String>) {
    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            // Channel closed, exit thread
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });
}

/// Run the client, reconnecting with backoff until the user quits or the relay
/// refuses the join.
pub async fn run_client(settings: ClientSettings) -> Result<(), ClientError> {
    let room_id = match settings.room_id {
        Some(room_id) => room_id,
        None => {
            let room_id = create_room(&settings.url).await?;
            tracing::info!("Created room {}", room_id);
            room_id
        }
    };
    let mut identity = Identity {
        room_id,
        client_id: settings.client_id,
        username: settings.username,
        language: settings.language,
    };
    let mut ws_url = join_url(
        &settings.url,
        &identity.room_id,
        &identity.client_id,
        &identity.username,
        identity.language,
    )?;

    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    spawn_readline(prompt(&identity.username), input_tx);

    let backoff = Backoff::default();
    let mut state = ClientState::initial();
    let mut socket = None;

    loop {
        let event = match &state {
            ClientState::Connecting { failures, .. } => {
                tracing::info!(
                    "Attempting to connect to room '{}' as '{}' (attempt {}/{})",
                    identity.room_id,
                    identity.client_id,
                    failures + 1,
                    backoff.max_attempts
                );
                match session::open(ws_url.as_str()).await {
                    Ok(ws_stream) => {
                        socket = Some(ws_stream);
                        ClientEvent::Opened
                    }
                    Err(e) => {
                        tracing::warn!("{}", e);
                        ClientEvent::Lost(e)
                    }
                }
            }
            ClientState::Connected => match socket.take() {
                Some(ws_stream) => {
                    match session::run_session(ws_stream, &identity, &mut input_rx).await {
                        SessionEnd::UserQuit => ClientEvent::UserQuit,
                        SessionEnd::Lost(e) => {
                            tracing::warn!("Connection lost: {}", e);
                            ClientEvent::Lost(e)
                        }
                    }
                }
                None => ClientEvent::Lost(ClientError::ConnectionError(
                    "no open connection".to_string(),
                )),
            },
            ClientState::Disconnected { retry_in, .. } => {
                tracing::info!("Reconnecting in {:?}...", retry_in);
                tokio::time::sleep(*retry_in).await;
                ClientEvent::BackoffElapsed
            }
            ClientState::Renewing { .. } => {
                let previous = std::mem::replace(
                    &mut identity.client_id,
                    uuid::Uuid::new_v4().to_string(),
                );
                tracing::info!(
                    "Client id '{}' is still held by the relay, rejoining as '{}'",
                    previous,
                    identity.client_id
                );
                ws_url = join_url(
                    &settings.url,
                    &identity.room_id,
                    &identity.client_id,
                    &identity.username,
                    identity.language,
                )?;
                ClientEvent::IdentityRenewed
            }
            ClientState::Exited(reason) => {
                return match reason {
                    ExitReason::UserQuit => {
                        tracing::info!("Client session ended normally");
                        Ok(())
                    }
                    ExitReason::Rejected(e) => Err(e.clone()),
                    ExitReason::GaveUp(e) => {
                        tracing::error!(
                            "Failed to reconnect after {} attempts. Exiting.",
                            backoff.max_attempts
                        );
                        Err(e.clone())
                    }
                };
            }
        };

        state = state.next(event, &backoff);
    }
}
