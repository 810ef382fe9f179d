//! UseCase 層のエラー定義

use thiserror::Error;

/// 参加（ハンドシェイク）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// room_id / client_id / language / username のいずれかが不正
    #[error("invalid join request: {0}")]
    InvalidJoinRequest(String),

    /// 同じ client_id がすでにいずれかのルームに参加している
    #[error("client '{0}' is already joined")]
    AlreadyJoined(String),
}

/// メッセージ・タイピング送信のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    /// 送信者がどのルームにも参加していない
    #[error("client '{0}' is not joined to any room")]
    NotJoined(String),

    /// 空白だけのメッセージ
    #[error("message is empty")]
    EmptyMessage,

    #[error("message exceeds {0} characters")]
    MessageTooLong(usize),
}

/// ルーム詳細取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("invalid room id: {0}")]
    InvalidRoomId(String),

    #[error("room not found")]
    RoomNotFound,
}
