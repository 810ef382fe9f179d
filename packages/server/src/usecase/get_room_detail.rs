//! UseCase: ルーム詳細取得（読み取り専用）

use std::sync::Arc;

use crate::domain::{Client, Language, RoomId, RoomRepository};

use super::error::GetRoomDetailError;

/// ルームの参加者と言語
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDetail {
    pub room_id: RoomId,
    /// 参加順
    pub members: Vec<Client>,
    pub languages: Vec<Language>,
}

pub struct GetRoomDetailUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomDetailUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, room_id: String) -> Result<RoomDetail, GetRoomDetailError> {
        let room_id = RoomId::new(room_id)
            .map_err(|e| GetRoomDetailError::InvalidRoomId(e.to_string()))?;

        let members = self.repository.members(&room_id).await;
        if members.is_empty() {
            return Err(GetRoomDetailError::RoomNotFound);
        }
        let languages = self
            .repository
            .languages_in_room(&room_id)
            .await
            .into_iter()
            .collect();

        Ok(RoomDetail {
            room_id,
            members,
            languages,
        })
    }
}
