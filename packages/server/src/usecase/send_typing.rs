//! UseCase: タイピング状態の通知
//!
//! 永続化もバッファリングもせず、本人以外の参加者にそのまま流す。

use std::sync::Arc;

use tsuyaku_shared::time::Clock;

use crate::{
    domain::{ClientId, MessagePusher, RoomRepository, Timestamp, TypingEvent},
    infrastructure::dto::websocket::OutboundEvent,
};

use super::error::SendMessageError;

/// タイピング通知のユースケース
pub struct SendTypingUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl SendTypingUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            clock,
        }
    }

    pub async fn execute(
        &self,
        from_client_id: &ClientId,
        is_typing: bool,
    ) -> Result<TypingEvent, SendMessageError> {
        let sender = self
            .repository
            .find_client(from_client_id)
            .await
            .ok_or_else(|| SendMessageError::NotJoined(from_client_id.as_str().to_string()))?;

        let event = TypingEvent {
            from: sender.id.clone(),
            username: sender.display_name.clone(),
            is_typing,
            timestamp: Timestamp::new(self.clock.now_millis()),
        };

        let targets: Vec<ClientId> = self
            .repository
            .members(&sender.room_id)
            .await
            .into_iter()
            .map(|member| member.id)
            .filter(|id| id != &sender.id)
            .collect();

        match OutboundEvent::Typing((&event).into()).to_json() {
            Ok(json) => {
                if let Err(e) = self.message_pusher.broadcast(targets, &json).await {
                    tracing::warn!("Failed to broadcast typing: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to encode typing: {}", e),
        }

        Ok(event)
    }
}
