//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - ルーム内の言語ごとの翻訳、1 つのペイロードへの集約、全参加者への配信
//!
//! ### なぜこのテストが必要か
//! - 送信時点でルームにいる全言語の訳文が 1 通のメッセージに揃うことを保証
//! - 翻訳が時間切れでも配信は止まらず、原文に縮退することを確認
//! - 同じ本文の 2 回目はキャッシュから返り、翻訳器を呼ばないことを確認
//! - ストア障害時も既定言語に戻らず翻訳されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：英語話者とヘブライ語話者のルームでのメッセージ送信
//! - 異常系：翻訳器の時間切れ、永続ストアの到達不能
//! - 異常系：空白だけ・長すぎるメッセージ、未参加の送信者

use std::sync::Arc;

use futures_util::future::join_all;
use tsuyaku_shared::time::Clock;

use crate::{
    domain::{
        ChatMessage, ClientId, MessagePusher, MessageText, RoomRepository, Timestamp,
        ValueObjectError,
    },
    infrastructure::{
        dto::websocket::OutboundEvent, sequencer::RoomSequencer, stats::RelayStats,
        translation::TranslationCache,
    },
};

use super::error::SendMessageError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    cache: Arc<TranslationCache>,
    sequencer: Arc<RoomSequencer>,
    stats: Arc<RelayStats>,
    clock: Arc<dyn Clock>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        cache: Arc<TranslationCache>,
        sequencer: Arc<RoomSequencer>,
        stats: Arc<RelayStats>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            cache,
            sequencer,
            stats,
            clock,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `from_client_id` - 送信者のクライアント ID
    /// * `text` - 受信したままの本文（トリムしない）
    ///
    /// # Returns
    ///
    /// * `Ok(ChatMessage)` - ルームの全参加者（送信者を含む）に配信したメッセージ
    /// * `Err(SendMessageError)` - 送信者が未参加、または本文が不正
    pub async fn execute(
        &self,
        from_client_id: &ClientId,
        text: String,
    ) -> Result<ChatMessage, SendMessageError> {
        // 1. 送信者と本文の検証
        let sender = self
            .repository
            .find_client(from_client_id)
            .await
            .ok_or_else(|| SendMessageError::NotJoined(from_client_id.as_str().to_string()))?;
        let text = MessageText::new(text).map_err(|e| match e {
            ValueObjectError::TooLong { max, .. } => SendMessageError::MessageTooLong(max),
            _ => SendMessageError::EmptyMessage,
        })?;

        // 2. ルーム内の順番を待つ（受信順に配信する）
        let room_id = sender.room_id.clone();
        let _turn = self.sequencer.lock(&room_id).await;
        let timestamp = Timestamp::new(self.clock.now_millis());

        // 3. ルーム内の言語（送信者の言語は必ず含める）
        let mut languages = self.repository.languages_in_room(&room_id).await;
        languages.insert(sender.language);

        // 4. 言語ごとの翻訳を並行に取得
        let translations = join_all(languages.iter().map(|&target| {
            let cache = &self.cache;
            let identity = room_id.as_str();
            let original = text.as_str();
            let source = sender.language;
            async move {
                let (translated, _cached) = cache
                    .get_or_translate(identity, original, source, target)
                    .await;
                (target, translated)
            }
        }))
        .await;

        let message = translations.into_iter().fold(
            ChatMessage::new(&sender, text, timestamp),
            |message, (language, translated)| message.with_translation(language, translated),
        );

        // 5. 送信者を含む全参加者に同じペイロードを配信
        let targets: Vec<ClientId> = self
            .repository
            .members(&room_id)
            .await
            .into_iter()
            .map(|member| member.id)
            .collect();
        match OutboundEvent::Message((&message).into()).to_json() {
            Ok(json) => {
                if let Err(e) = self.message_pusher.broadcast(targets, &json).await {
                    tracing::warn!("Failed to broadcast message: {}", e);
                }
                self.stats.record_message_relayed();
            }
            Err(e) => tracing::warn!("Failed to encode message: {}", e),
        }

        tracing::debug!(
            "Relayed message from '{}' in room '{}' with {} translation(s)",
            message.from,
            room_id,
            message.translations.len()
        );
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{Language, MAX_MESSAGE_LENGTH},
        infrastructure::dto::websocket::MessagePayload,
        usecase::test_support::{CountingProvider, Fixture, SlowProvider, drain},
    };

    fn client_id(id: &str) -> ClientId {
        ClientId::new(id.to_string()).unwrap()
    }

    fn message_events(events: Vec<OutboundEvent>) -> Vec<MessagePayload> {
        events
            .into_iter()
            .filter_map(|e| match e {
                OutboundEvent::Message(payload) => Some(payload),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_english_to_hebrew_with_cache_hit_on_repeat() {
        // テスト項目: 英語とヘブライ語のルームで訳文付きメッセージが全員に届き、2 回目はキャッシュから返る
        // given (前提条件):
        let provider = Arc::new(CountingProvider::default());
        let fixture = Fixture::new(provider.clone());
        let mut alice_rx = fixture.join("room-1", "alice", "en").await;
        let mut bob_rx = fixture.join("room-1", "bob", "he").await;
        drain(&mut alice_rx);
        let usecase = fixture.send_message_usecase();

        // when (操作): alice が同じ本文を 2 回送る
        let first = usecase
            .execute(&client_id("alice"), "How are you?".to_string())
            .await
            .unwrap();
        let second = usecase
            .execute(&client_id("alice"), "How are you?".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(first.translations[&Language::He], "מה שלומך?");
        assert_eq!(first.translations[&Language::En], "How are you?");
        assert_eq!(second.translations, first.translations);
        // 翻訳器は 1 回だけ呼ばれ、2 回目はキャッシュヒット
        assert_eq!(provider.calls(), 1);
        let snapshot = fixture.stats.snapshot();
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.cache_hits, 1);
        assert_eq!(snapshot.messages_relayed, 2);

        // 送信者を含む全員に同じペイロードが届く
        let alice_messages = message_events(drain(&mut alice_rx));
        let bob_messages = message_events(drain(&mut bob_rx));
        assert_eq!(alice_messages.len(), 2);
        assert_eq!(alice_messages, bob_messages);
        assert_eq!(bob_messages[0].original_text, "How are you?");
        assert_eq!(bob_messages[0].sender_language, Language::En);
        assert_eq!(bob_messages[0].translations[&Language::He], "מה שלומך?");
    }

    #[tokio::test]
    async fn test_translator_timeout_delivers_original_text() {
        // テスト項目: 翻訳器が時間切れでも配信され、translations[target] は原文になる
        // given (前提条件):
        let fixture = Fixture::new(Arc::new(SlowProvider));
        let mut alice_rx = fixture.join("room-1", "alice", "en").await;
        let mut bob_rx = fixture.join("room-1", "bob", "ja").await;
        drain(&mut alice_rx);
        let usecase = fixture.send_message_usecase();

        // when (操作):
        let result = usecase
            .execute(&client_id("alice"), "Good morning".to_string())
            .await;

        // then (期待する結果):
        let message = result.unwrap();
        assert_eq!(message.translations[&Language::Ja], "Good morning");
        assert_eq!(message_events(drain(&mut alice_rx)).len(), 1);
        let bob_messages = message_events(drain(&mut bob_rx));
        assert_eq!(bob_messages.len(), 1);
        assert_eq!(bob_messages[0].translations[&Language::Ja], "Good morning");
        assert_eq!(fixture.stats.snapshot().translation_failures, 1);
        // 縮退した結果はキャッシュされない
        assert_eq!(fixture.cache.local_len().await, 0);
    }

    #[tokio::test]
    async fn test_translates_while_store_is_unreachable() {
        // テスト項目: 永続ストアが落ちていても、ルームの言語が既定言語に戻らず翻訳される
        // given (前提条件):
        let provider = Arc::new(CountingProvider::default());
        let fixture = Fixture::new(provider.clone());
        fixture.store.set_reachable(false);
        let _alice_rx = fixture.join("room-1", "alice", "en").await;
        let _bob_rx = fixture.join("room-1", "bob", "he").await;
        let usecase = fixture.send_message_usecase();

        // when (操作):
        let message = usecase
            .execute(&client_id("alice"), "How are you?".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(message.translations[&Language::He], "מה שלומך?");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_departed_language_is_not_translated_after_store_recovers() {
        // テスト項目: ストア障害中に退出した参加者の言語へは、ストア復旧後も翻訳しない
        // given (前提条件):
        let provider = Arc::new(CountingProvider::default());
        let fixture = Fixture::new(provider.clone());
        let _alice_rx = fixture.join("room-1", "alice", "en").await;
        let _bob_rx = fixture.join("room-1", "bob", "he").await;
        let _dave_rx = fixture.join("room-1", "dave", "ja").await;
        fixture.store.set_reachable(false);
        fixture.disconnect_usecase().execute(&client_id("dave")).await;
        fixture.store.set_reachable(true);
        let usecase = fixture.send_message_usecase();

        // when (操作):
        let message = usecase
            .execute(&client_id("alice"), "How are you?".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            message.translations.keys().copied().collect::<Vec<_>>(),
            vec![Language::En, Language::He]
        );
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_one_translation_per_distinct_language() {
        // テスト項目: 同じ言語の参加者が複数いても翻訳は言語ごとに 1 回
        // given (前提条件):
        let provider = Arc::new(CountingProvider::default());
        let fixture = Fixture::new(provider.clone());
        let _a = fixture.join("room-1", "alice", "en").await;
        let _b = fixture.join("room-1", "bob", "fr").await;
        let _c = fixture.join("room-1", "carol", "fr").await;
        let _d = fixture.join("room-1", "dave", "de").await;
        let usecase = fixture.send_message_usecase();

        // when (操作):
        let message = usecase
            .execute(&client_id("alice"), "Hello".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(provider.calls(), 2);
        assert_eq!(message.translations.len(), 3);
        assert_eq!(message.translations[&Language::Fr], "[fr] Hello");
        assert_eq!(message.translations[&Language::De], "[de] Hello");
    }

    #[tokio::test]
    async fn test_messages_are_delivered_in_receipt_order() {
        // テスト項目: 同じルームのメッセージは受信順に配信される
        // given (前提条件):
        let fixture = Fixture::new(Arc::new(CountingProvider::default()));
        let _alice_rx = fixture.join("room-1", "alice", "en").await;
        let mut bob_rx = fixture.join("room-1", "bob", "es").await;
        let usecase = fixture.send_message_usecase();

        // when (操作):
        for i in 0..5 {
            usecase
                .execute(&client_id("alice"), format!("message {}", i))
                .await
                .unwrap();
        }

        // then (期待する結果):
        let texts: Vec<String> = message_events(drain(&mut bob_rx))
            .into_iter()
            .map(|m| m.original_text)
            .collect();
        assert_eq!(
            texts,
            (0..5).map(|i| format!("message {}", i)).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_text_is_relayed_verbatim() {
        // テスト項目: 本文は前後の空白も含めてそのまま配信される
        // given (前提条件):
        let fixture = Fixture::new(Arc::new(CountingProvider::default()));
        let _alice_rx = fixture.join("room-1", "alice", "en").await;
        let usecase = fixture.send_message_usecase();

        // when (操作):
        let message = usecase
            .execute(&client_id("alice"), "  spaced  ".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(message.text.as_str(), "  spaced  ");
    }

    #[tokio::test]
    async fn test_invalid_messages_are_rejected() {
        // テスト項目: 空白だけ・長すぎるメッセージ・未参加の送信者は拒否され、配信されない
        // given (前提条件):
        let fixture = Fixture::new(Arc::new(CountingProvider::default()));
        let mut alice_rx = fixture.join("room-1", "alice", "en").await;
        let usecase = fixture.send_message_usecase();

        // when (操作):
        let blank = usecase.execute(&client_id("alice"), "   ".to_string()).await;
        let too_long = usecase
            .execute(&client_id("alice"), "a".repeat(MAX_MESSAGE_LENGTH + 1))
            .await;
        let stranger = usecase
            .execute(&client_id("mallory"), "hi".to_string())
            .await;

        // then (期待する結果):
        assert_eq!(blank, Err(SendMessageError::EmptyMessage));
        assert_eq!(
            too_long,
            Err(SendMessageError::MessageTooLong(MAX_MESSAGE_LENGTH))
        );
        assert_eq!(
            stranger,
            Err(SendMessageError::NotJoined("mallory".to_string()))
        );
        assert!(drain(&mut alice_rx).is_empty());
        assert_eq!(fixture.stats.snapshot().messages_relayed, 0);
    }
}
