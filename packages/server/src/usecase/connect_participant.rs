//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - ハンドシェイクの検証、ルームへの参加、user_joined の通知
//!
//! ### なぜこのテストが必要か
//! - 不正なクエリパラメータでの参加を防ぐ
//! - 同じ client_id の二重参加を防ぐ
//! - user_joined が本人以外にだけ届くことを保証
//!
//! ### どのような状況を想定しているか
//! - 正常系：新規参加者の接続と通知
//! - 異常系：未対応の言語コード、空の表示名、不正な room_id
//! - 異常系：参加済みの client_id での接続試行

use std::sync::Arc;

use tsuyaku_shared::time::Clock;

use crate::{
    domain::{
        Client, ClientId, DisplayName, Language, MessagePusher, PusherChannel, RegistryError,
        RoomId, RoomRepository, Timestamp, ValueObjectError,
    },
    infrastructure::{
        dto::websocket::{OutboundEvent, PresencePayload},
        sequencer::RoomSequencer,
    },
};

use super::error::ConnectError;

/// ハンドシェイクで受け取った未検証の値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    pub room_id: String,
    pub client_id: String,
    pub language: String,
    pub username: String,
}

impl JoinRequest {
    fn validate(self) -> Result<(RoomId, ClientId, DisplayName, Language), ConnectError> {
        fn invalid(field: &str, e: ValueObjectError) -> ConnectError {
            ConnectError::InvalidJoinRequest(format!("{}: {}", field, e))
        }

        let room_id = RoomId::new(self.room_id).map_err(|e| invalid("room_id", e))?;
        let client_id = ClientId::new(self.client_id).map_err(|e| invalid("client_id", e))?;
        let language = self
            .language
            .parse::<Language>()
            .map_err(|e| invalid("language", e))?;
        let display_name = DisplayName::new(self.username).map_err(|e| invalid("username", e))?;

        Ok((room_id, client_id, display_name, language))
    }
}

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    sequencer: Arc<RoomSequencer>,
    clock: Arc<dyn Clock>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
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

    /// 参加者接続を実行
    ///
    /// # Arguments
    ///
    /// * `request` - ハンドシェイクのクエリパラメータ（未検証）
    /// * `sender` - クライアントへのメッセージ送信用チャンネル
    ///
    /// # Returns
    ///
    /// * `Ok(Client)` - 参加成功。user_joined は他の参加者に通知済み
    /// * `Err(ConnectError)` - 参加失敗（何も登録されない）
    pub async fn execute(
        &self,
        request: JoinRequest,
        sender: PusherChannel,
    ) -> Result<Client, ConnectError> {
        // 1. 検証
        let (room_id, client_id, display_name, language) = request.validate()?;

        // 2. Registry に参加
        let client = self
            .repository
            .join(room_id, client_id, display_name, language)
            .await
            .map_err(|e| match e {
                RegistryError::AlreadyJoined { client_id, .. } => {
                    ConnectError::AlreadyJoined(client_id)
                }
            })?;

        // 3. MessagePusher にクライアントを登録
        self.message_pusher
            .register_client(client.id.clone(), sender)
            .await;

        // 4. 本人以外に user_joined を通知（ルーム内の順序を守る）
        let _turn = self.sequencer.lock(&client.room_id).await;
        let targets: Vec<ClientId> = self
            .repository
            .members(&client.room_id)
            .await
            .into_iter()
            .map(|member| member.id)
            .filter(|id| id != &client.id)
            .collect();
        let event = OutboundEvent::UserJoined(PresencePayload::from_client(
            &client,
            Timestamp::new(self.clock.now_millis()),
        ));
        match event.to_json() {
            Ok(json) => {
                if let Err(e) = self.message_pusher.broadcast(targets, &json).await {
                    tracing::warn!("Failed to broadcast user_joined: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to encode user_joined: {}", e),
        }

        tracing::info!(
            "Client '{}' ({}, {}) joined room '{}'",
            client.id,
            client.display_name,
            client.language,
            client.room_id
        );
        Ok(client)
    }
}
