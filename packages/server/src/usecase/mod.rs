//! UseCase 層
//!
//! 接続・切断・メッセージ送信などのアプリケーション操作を定義します。
//! ドメイン層の trait にだけ依存し、具体的な実装は起動時に注入されます。

mod connect_participant;
mod create_room;
mod disconnect_participant;
mod error;
mod get_health;
mod get_room_detail;
mod send_message;
mod send_typing;

#[cfg(test)]
pub(crate) mod test_support;

pub use connect_participant::{ConnectParticipantUseCase, JoinRequest};
pub use create_room::CreateRoomUseCase;
pub use disconnect_participant::DisconnectParticipantUseCase;
pub use error::{ConnectError, GetRoomDetailError, SendMessageError};
pub use get_health::{GetHealthUseCase, HealthReport};
pub use get_room_detail::{GetRoomDetailUseCase, RoomDetail};
pub use send_message::SendMessageUseCase;
pub use send_typing::SendTypingUseCase;
