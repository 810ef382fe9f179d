//! Message formatting utilities for client display.

use chrono::DateTime;
use tsuyaku_server::{
    domain::Language,
    infrastructure::dto::websocket::{MessagePayload, PresencePayload, TypingPayload},
};
use tsuyaku_shared::time::timestamp_to_clock_label;

const RULE: &str = "------------------------------------------------------------";

/// Local `HH:MM:SS` for an RFC 3339 wire timestamp; unparsable input is shown as-is.
fn clock_label(rfc3339: &str) -> String {
    match DateTime::parse_from_rfc3339(rfc3339) {
        Ok(at) => timestamp_to_clock_label(at.timestamp_millis()),
        Err(_) => rfc3339.to_string(),
    }
}

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format a chat message for a reader of `own_language`
    ///
    /// The reader's translation comes first. The original follows when it was
    /// written in another language, or stands alone when no translation arrived.
    pub fn format_message(payload: &MessagePayload, own_language: Language) -> String {
        let sent_at = clock_label(&payload.timestamp);
        let translated = payload
            .translations
            .get(&own_language)
            .filter(|_| payload.sender_language != own_language);

        let body = match translated {
            Some(text) => format!(
                "@{}: {}\n  ({}) {}",
                payload.username, text, payload.sender_language, payload.original_text
            ),
            None => format!("@{}: {}", payload.username, payload.original_text),
        };

        format!("\n\n{}\n{}\nsent at {}\n{}\n", RULE, body, sent_at, RULE)
    }

    /// Format a participant-joined notification
    pub fn format_user_joined(payload: &PresencePayload) -> String {
        format!(
            "\n+ {} ({}) entered at {}\n",
            payload.username,
            payload.language.display_name(),
            clock_label(&payload.timestamp)
        )
    }

    /// Format a participant-left notification
    pub fn format_user_left(payload: &PresencePayload) -> String {
        format!(
            "\n- {} left at {}\n",
            payload.username,
            clock_label(&payload.timestamp)
        )
    }

    /// Format a typing indicator; nothing is shown when typing stops
    pub fn format_typing(payload: &TypingPayload) -> Option<String> {
        payload
            .is_typing
            .then(|| format!("\n  {} is typing...\n", payload.username))
    }

    /// Format the banner shown once a session is up
    pub fn format_welcome(username: &str, room_id: &str, language: Language) -> String {
        format!(
            "\nYou are '{}' in room '{}', reading in {}.\n\
             Type messages and press Enter to send. Press Ctrl+C to exit.\n",
            username,
            room_id,
            language.display_name()
        )
    }

    /// Format a message that could not be decoded
    pub fn format_raw_message(text: &str) -> String {
        format!("\n{}\n", text)
    }
}
