//! UseCase: ルーム作成
//!
//! ルームは最初の参加で Registry に作られるため、ここでは推測されにくい ID を払い出すだけ。

use std::sync::Arc;

use tsuyaku_shared::time::Clock;

use crate::domain::{RoomId, RoomIdFactory, Timestamp};

pub struct CreateRoomUseCase {
    clock: Arc<dyn Clock>,
}

impl CreateRoomUseCase {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn execute(&self) -> (RoomId, Timestamp) {
        let room_id = RoomIdFactory::generate();
        tracing::info!("Room '{}' created", room_id);
        (room_id, Timestamp::new(self.clock.now_millis()))
    }
}
