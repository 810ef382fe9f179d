//! Relay HTTP endpoints and URL building.

use reqwest::Url;
use tsuyaku_server::{domain::Language, infrastructure::dto::http::CreateRoomResponse};

use crate::error::ClientError;

/// HTTP base for a `ws://` / `wss://` relay URL.
pub fn http_base(relay_url: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(relay_url)
        .map_err(|e| ClientError::ConnectionError(format!("invalid url '{}': {}", relay_url, e)))?;
    let scheme = match url.scheme() {
        "ws" | "http" => "http",
        "wss" | "https" => "https",
        other => {
            return Err(ClientError::ConnectionError(format!(
                "unsupported scheme '{}'",
                other
            )));
        }
    };
    url.set_scheme(scheme).map_err(|_| {
        ClientError::ConnectionError(format!("cannot use scheme '{}' for '{}'", scheme, relay_url))
    })?;
    Ok(url)
}

/// WebSocket join URL with the handshake query parameters encoded.
pub fn join_url(
    relay_url: &str,
    room_id: &str,
    client_id: &str,
    username: &str,
    language: Language,
) -> Result<Url, ClientError> {
    let mut url = http_base(relay_url)?;
    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
    url.set_scheme(scheme)
        .map_err(|_| ClientError::ConnectionError(format!("invalid url '{}'", relay_url)))?;
    url.path_segments_mut()
        .map_err(|_| ClientError::ConnectionError(format!("invalid url '{}'", relay_url)))?
        .pop_if_empty()
        .push("ws")
        .push(room_id);
    url.query_pairs_mut()
        .append_pair("client_id", client_id)
        .append_pair("language", language.code())
        .append_pair("username", username);
    Ok(url)
}

/// Ask the relay for a fresh room id (`POST /rooms`).
pub async fn create_room(relay_url: &str) -> Result<String, ClientError> {
    let mut url = http_base(relay_url)?;
    url.set_path("/rooms");

    let response = reqwest::Client::new()
        .post(url)
        .send()
        .await
        .map_err(|e| ClientError::RoomCreation(e.to_string()))?
        .error_for_status()
        .map_err(|e| ClientError::RoomCreation(e.to_string()))?;
    let body: CreateRoomResponse = response
        .json()
        .await
        .map_err(|e| ClientError::RoomCreation(e.to_string()))?;

    Ok(body.room_id)
}
