//! ドメイン層のエラー定義

use std::time::Duration;

use thiserror::Error;

/// 値オブジェクトの検証エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{0} contains invalid characters")]
    InvalidCharacters(&'static str),

    #[error("unsupported language code '{0}'")]
    UnsupportedLanguage(String),
}

/// Room Registry のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// 同じ client_id がすでにいずれかのルームに参加している
    #[error("client '{client_id}' already joined room '{room_id}'")]
    AlreadyJoined { client_id: String, room_id: String },
}

/// 永続ストア（Redis など）のエラー
///
/// 呼び出し側は必ずローカルのミラー／キャッシュにフォールバックする。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unreachable(String),

    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("store backend error: {0}")]
    Backend(String),
}

/// 翻訳のエラー
///
/// いずれも原文の配信に縮退し、送信者には返さない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    #[error("translation timed out after {0:?}")]
    Timeout(Duration),

    #[error("translation budget exhausted for '{0}'")]
    RateLimited(String),

    #[error("upstream translation provider failed: {0}")]
    Upstream(String),
}

/// メッセージ送信（通知）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("no recipient reachable among {0} targets")]
    NoRecipientReached(usize),
}
