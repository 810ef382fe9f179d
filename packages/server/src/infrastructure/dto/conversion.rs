//! Conversion logic from domain entities to DTOs.
//!
//! Conversion is one-way: inbound DTOs are validated into value objects by the
//! use cases, never converted wholesale.

use tsuyaku_shared::time::timestamp_to_rfc3339;

use crate::domain::{ChatMessage, Client, Language, Timestamp, TypingEvent};
use crate::infrastructure::dto::{
    http::{LanguageDto, MemberDto},
    websocket::{MessagePayload, PresencePayload, TypingPayload},
};

impl From<&ChatMessage> for MessagePayload {
    fn from(model: &ChatMessage) -> Self {
        Self {
            client_id: model.from.as_str().to_string(),
            username: model.username.as_str().to_string(),
            timestamp: timestamp_to_rfc3339(model.timestamp.value()),
            sender_language: model.source_language,
            original_text: model.text.as_str().to_string(),
            translations: model.translations.clone(),
        }
    }
}

impl From<&TypingEvent> for TypingPayload {
    fn from(model: &TypingEvent) -> Self {
        Self {
            client_id: model.from.as_str().to_string(),
            username: model.username.as_str().to_string(),
            is_typing: model.is_typing,
            timestamp: timestamp_to_rfc3339(model.timestamp.value()),
        }
    }
}

impl PresencePayload {
    /// Presence event for `client` observed at `at`
    pub fn from_client(client: &Client, at: Timestamp) -> Self {
        Self {
            client_id: client.id.as_str().to_string(),
            username: client.display_name.as_str().to_string(),
            language: client.language,
            timestamp: timestamp_to_rfc3339(at.value()),
        }
    }
}

impl From<&Client> for MemberDto {
    fn from(model: &Client) -> Self {
        Self {
            client_id: model.id.as_str().to_string(),
            username: model.display_name.as_str().to_string(),
            language: model.language,
            joined_at: timestamp_to_rfc3339(model.joined_at.value()),
        }
    }
}

impl From<Language> for LanguageDto {
    fn from(language: Language) -> Self {
        Self {
            code: language.code().to_string(),
            name: language.display_name().to_string(),
        }
    }
}
