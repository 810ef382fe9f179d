//! UseCase テスト用の組み立てヘルパー
//!
//! 本物の RoomRegistry / InMemoryStore / WebSocketMessagePusher / TranslationCache を
//! 組み立て、上流プロバイダだけを差し替える。

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tsuyaku_shared::time::FixedClock;

use crate::{
    domain::{Language, TranslationError, TranslationProvider},
    infrastructure::{
        dto::websocket::OutboundEvent,
        message_pusher::WebSocketMessagePusher,
        repository::RoomRegistry,
        sequencer::RoomSequencer,
        stats::RelayStats,
        store::InMemoryStore,
        translation::{RateLimiter, TranslationCache, TranslatorClient},
    },
};

use super::{
    ConnectParticipantUseCase, DisconnectParticipantUseCase, JoinRequest, SendMessageUseCase,
    SendTypingUseCase,
};

/// 決まった訳文を返し、呼び出し回数を数えるプロバイダ
#[derive(Default)]
pub struct CountingProvider {
    pub calls: AtomicUsize,
}

impl CountingProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranslationProvider for CountingProvider {
    async fn translate(
        &self,
        text: &str,
        _source: Language,
        target: Language,
    ) -> Result<String, TranslationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match (text, target) {
            ("How are you?", Language::He) => Ok("מה שלומך?".to_string()),
            _ => Ok(format!("[{}] {}", target.code(), text)),
        }
    }
}

/// 常に時間切れになるプロバイダ
pub struct SlowProvider;

#[async_trait]
impl TranslationProvider for SlowProvider {
    async fn translate(
        &self,
        text: &str,
        _source: Language,
        _target: Language,
    ) -> Result<String, TranslationError> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(format!("late {}", text))
    }
}

pub struct Fixture {
    pub store: Arc<InMemoryStore>,
    pub repository: Arc<RoomRegistry>,
    pub pusher: Arc<WebSocketMessagePusher>,
    pub sequencer: Arc<RoomSequencer>,
    pub stats: Arc<RelayStats>,
    pub cache: Arc<TranslationCache>,
    pub clock: Arc<FixedClock>,
}

impl Fixture {
    pub fn new(provider: Arc<dyn TranslationProvider>) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(FixedClock::new(1_704_067_200_000));
        let stats = Arc::new(RelayStats::new());
        let translator = Arc::new(TranslatorClient::new(
            provider,
            RateLimiter::new(100, Duration::from_secs(60)),
            Duration::from_millis(200),
        ));
        Self {
            repository: Arc::new(RoomRegistry::new(store.clone(), clock.clone())),
            pusher: Arc::new(WebSocketMessagePusher::new()),
            sequencer: Arc::new(RoomSequencer::new()),
            cache: Arc::new(TranslationCache::new(
                store.clone(),
                translator,
                stats.clone(),
                100,
            )),
            store,
            stats,
            clock,
        }
    }

    pub fn connect_usecase(&self) -> ConnectParticipantUseCase {
        ConnectParticipantUseCase::new(
            self.repository.clone(),
            self.pusher.clone(),
            self.sequencer.clone(),
            self.clock.clone(),
        )
    }

    pub fn disconnect_usecase(&self) -> DisconnectParticipantUseCase {
        DisconnectParticipantUseCase::new(
            self.repository.clone(),
            self.pusher.clone(),
            self.sequencer.clone(),
            self.clock.clone(),
        )
    }

    pub fn send_message_usecase(&self) -> SendMessageUseCase {
        SendMessageUseCase::new(
            self.repository.clone(),
            self.pusher.clone(),
            self.cache.clone(),
            self.sequencer.clone(),
            self.stats.clone(),
            self.clock.clone(),
        )
    }

    pub fn send_typing_usecase(&self) -> SendTypingUseCase {
        SendTypingUseCase::new(
            self.repository.clone(),
            self.pusher.clone(),
            self.clock.clone(),
        )
    }

    /// 参加させ、そのクライアント宛てのイベントを受け取るチャンネルを返す
    pub async fn join(
        &self,
        room_id: &str,
        client_id: &str,
        language: &str,
    ) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.connect_usecase()
            .execute(join_request(room_id, client_id, language), tx)
            .await
            .unwrap();
        rx
    }
}

pub fn join_request(room_id: &str, client_id: &str, language: &str) -> JoinRequest {
    JoinRequest {
        room_id: room_id.to_string(),
        client_id: client_id.to_string(),
        language: language.to_string(),
        username: format!("User {}", client_id),
    }
}

/// 受信済みのイベントをすべて取り出す
pub fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<OutboundEvent> {
    let mut events = Vec::new();
    while let Ok(json) = rx.try_recv() {
        events.push(serde_json::from_str(&json).unwrap());
    }
    events
}
