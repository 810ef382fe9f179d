//! WebSocket event DTOs.
//!
//! Both directions are closed tagged unions keyed by `type`; a frame with an
//! unknown `type` fails to decode instead of being silently dropped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::Language;

/// Client → server event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    Message { text: String },
    Typing { is_typing: bool },
}

/// Server → client event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    Message(MessagePayload),
    UserJoined(PresencePayload),
    UserLeft(PresencePayload),
    Typing(TypingPayload),
}

/// A chat message with every translation for the room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub client_id: String,
    pub username: String,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub sender_language: Language,
    pub original_text: String,
    pub translations: BTreeMap<Language, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresencePayload {
    pub client_id: String,
    pub username: String,
    pub language: Language,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingPayload {
    pub client_id: String,
    pub username: String,
    pub is_typing: bool,
    pub timestamp: String,
}

impl OutboundEvent {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
