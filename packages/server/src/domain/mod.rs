//! ドメイン層
//!
//! 値オブジェクト・エンティティ・接続の状態遷移と、Infrastructure 層が実装する
//! trait（Repository / Store / TranslationProvider / MessagePusher）を定義します。

pub mod connection;
pub mod entity;
pub mod error;
pub mod message_pusher;
pub mod repository;
pub mod translation;
pub mod value_object;

pub use connection::{ConnectionEvent, ConnectionState};
pub use entity::{ChatMessage, Client, TypingEvent};
pub use error::{
    MessagePushError, RegistryError, StoreError, TranslationError, ValueObjectError,
};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use repository::{MembershipStore, RoomRepository, StoreHealth};
pub use translation::{CacheKey, TranslationProvider, TranslationStore};
pub use value_object::{
    ClientId, DisplayName, Language, MAX_MESSAGE_LENGTH, MessageText, RoomId, RoomIdFactory,
    Timestamp,
};

#[cfg(test)]
pub use translation::MockTranslationProvider;
