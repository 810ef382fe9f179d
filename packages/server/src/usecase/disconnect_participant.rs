//! UseCase: 参加者切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - 退出、送信チャンネルの破棄、user_left の通知
//!
//! ### なぜこのテストが必要か
//! - 切断経路が複数（正常な close・ソケットエラー・送信失敗）あっても、参加者数の減少と
//!   user_left の通知がちょうど 1 回であることを保証
//! - 最後の参加者が抜けたルームが破棄されることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者の切断と通知
//! - エッジケース：同じ参加者の切断が重複して呼ばれる
//! - エッジケース：最後の参加者の切断（通知対象なし）

use std::sync::Arc;

use tsuyaku_shared::time::Clock;

use crate::{
    domain::{Client, ClientId, MessagePusher, RoomRepository, Timestamp},
    infrastructure::{
        dto::websocket::{OutboundEvent, PresencePayload},
        sequencer::RoomSequencer,
    },
};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    sequencer: Arc<RoomSequencer>,
    clock: Arc<dyn Clock>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        sequencer: Arc<RoomSequencer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
            sequencer,
            clock,
        }
    }

    /// 参加者切断を実行
    ///
    /// 冪等。実際に退出させた呼び出しだけが `Some` を返し、user_left を通知する。
    pub async fn execute(&self, client_id: &ClientId) -> Option<Client> {
        // 1. Registry から退出（2 回目以降はここで終わる）
        let client = self.repository.leave(client_id).await?;

        // 2. 送信チャンネルを破棄（pusher_loop が終了する）
        self.message_pusher.unregister_client(client_id).await;

        // 3. 残りの参加者に user_left を通知
        {
            let _turn = self.sequencer.lock(&client.room_id).await;
            let targets: Vec<ClientId> = self
                .repository
                .members(&client.room_id)
                .await
                .into_iter()
                .map(|member| member.id)
                .collect();

            if !targets.is_empty() {
                let event = OutboundEvent::UserLeft(PresencePayload::from_client(
                    &client,
                    Timestamp::new(self.clock.now_millis()),
                ));
                match event.to_json() {
                    Ok(json) => {
                        if let Err(e) = self.message_pusher.broadcast(targets, &json).await {
                            tracing::warn!("Failed to broadcast user_left: {}", e);
                        }
                    }
                    Err(e) => tracing::warn!("Failed to encode user_left: {}", e),
                }
            }
        }

        // 4. 空になったルームの順序付けスロットを片付ける
        if self.repository.members(&client.room_id).await.is_empty() {
            self.sequencer.release(&client.room_id).await;
        }

        tracing::info!("Client '{}' left room '{}'", client.id, client.room_id);
        Some(client)
    }
}
