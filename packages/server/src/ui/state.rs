//! Shared application state.

use std::sync::Arc;

use crate::usecase::{
    ConnectParticipantUseCase, CreateRoomUseCase, DisconnectParticipantUseCase,
    GetHealthUseCase, GetRoomDetailUseCase, SendMessageUseCase, SendTypingUseCase,
};

/// Use cases reachable from the handlers
pub struct AppState {
    /// ConnectParticipantUseCase（参加者接続のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// SendTypingUseCase（タイピング通知のユースケース）
    pub send_typing_usecase: Arc<SendTypingUseCase>,
    /// CreateRoomUseCase（ルーム作成のユースケース）
    pub create_room_usecase: Arc<CreateRoomUseCase>,
    /// GetHealthUseCase（ヘルスレポートのユースケース）
    pub get_health_usecase: Arc<GetHealthUseCase>,
    /// GetRoomDetailUseCase（ルーム詳細取得のユースケース）
    pub get_room_detail_usecase: Arc<GetRoomDetailUseCase>,
}
