//! Error types for the terminal client.

use thiserror::Error;

/// Close code the relay uses for a malformed join request
pub const CLOSE_INVALID_JOIN_REQUEST: u16 = 4400;
/// Close code the relay uses when the client id is already in a room
pub const CLOSE_ALREADY_JOINED: u16 = 4409;

/// Client-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Room, language or username was rejected by the relay
    #[error("Join request rejected: {0}")]
    InvalidJoinRequest(String),

    /// Client ID is already in use
    #[error("Client ID '{0}' is already connected")]
    DuplicateClientId(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// `POST /rooms` failed
    #[error("Failed to create room: {0}")]
    RoomCreation(String),
}

impl ClientError {
    /// Map a close frame from the relay to an error.
    pub fn from_close(code: u16, reason: &str, client_id: &str) -> Self {
        match code {
            CLOSE_INVALID_JOIN_REQUEST => Self::InvalidJoinRequest(reason.to_string()),
            CLOSE_ALREADY_JOINED => Self::DuplicateClientId(client_id.to_string()),
            _ => Self::ConnectionError(format!("closed by server ({}): {}", code, reason)),
        }
    }

    /// Errors that retrying with the same identity cannot fix
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::InvalidJoinRequest(_) | Self::DuplicateClientId(_) | Self::RoomCreation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_close_maps_relay_codes() {
        // テスト項目: 中継サーバーの close コードが対応するエラーに変換される
        // given (前提条件):
        let client_id = "alice";

        // when (操作):
        let invalid = ClientError::from_close(4400, "language: unsupported", client_id);
        let duplicate = ClientError::from_close(4409, "already joined", client_id);
        let normal = ClientError::from_close(1000, "", client_id);

        // then (期待する結果):
        assert_eq!(
            invalid,
            ClientError::InvalidJoinRequest("language: unsupported".to_string())
        );
        assert_eq!(duplicate, ClientError::DuplicateClientId("alice".to_string()));
        assert!(matches!(normal, ClientError::ConnectionError(_)));
    }

    #[test]
    fn test_only_rejections_are_terminal() {
        // テスト項目: 参加拒否のみ終了扱いで、通信エラーは再接続の対象になる
        // given (前提条件):
        let terminal = [
            ClientError::InvalidJoinRequest("username: empty".to_string()),
            ClientError::DuplicateClientId("alice".to_string()),
        ];
        let retryable = ClientError::ConnectionError("reset by peer".to_string());

        // when (操作) / then (期待する結果):
        assert!(terminal.iter().all(ClientError::is_terminal));
        assert!(!retryable.is_terminal());
    }
}
