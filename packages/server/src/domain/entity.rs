//! エンティティ定義

use std::collections::BTreeMap;

use super::value_object::{ClientId, DisplayName, Language, MessageText, RoomId, Timestamp};

/// ルームに参加しているクライアント
///
/// ソケットは持たない（ソケットは MessagePusher 側が所有する）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: ClientId,
    pub room_id: RoomId,
    pub display_name: DisplayName,
    pub language: Language,
    pub joined_at: Timestamp,
}

impl Client {
    pub fn new(
        id: ClientId,
        room_id: RoomId,
        display_name: DisplayName,
        language: Language,
        joined_at: Timestamp,
    ) -> Self {
        Self {
            id,
            room_id,
            display_name,
            language,
            joined_at,
        }
    }
}

/// 翻訳付きチャットメッセージ
///
/// 配信が終わるまでメモリ上にだけ存在する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub from: ClientId,
    pub username: DisplayName,
    pub text: MessageText,
    pub source_language: Language,
    pub timestamp: Timestamp,
    /// 送信時点でルームに存在した言語ごとの訳文
    pub translations: BTreeMap<Language, String>,
}

impl ChatMessage {
    pub fn new(sender: &Client, text: MessageText, timestamp: Timestamp) -> Self {
        Self {
            from: sender.id.clone(),
            username: sender.display_name.clone(),
            text,
            source_language: sender.language,
            timestamp,
            translations: BTreeMap::new(),
        }
    }

    pub fn with_translation(mut self, language: Language, text: String) -> Self {
        self.translations.insert(language, text);
        self
    }
}

/// タイピング状態の通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingEvent {
    pub from: ClientId,
    pub username: DisplayName,
    pub is_typing: bool,
    pub timestamp: Timestamp,
}
