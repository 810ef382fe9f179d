//! Per-room sequencer
//!
//! One async FIFO mutex per room. Holding a room's guard serialises the
//! `user_joined` broadcast and message translation + broadcast inside that room,
//! so events leave in receipt order. Distinct rooms never contend.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::RoomId;

#[derive(Default)]
pub struct RoomSequencer {
    rooms: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl RoomSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for this room's turn. Waiters are served in arrival order.
    pub async fn lock(&self, room_id: &RoomId) -> OwnedMutexGuard<()> {
        let slot = {
            let mut rooms = self.rooms.lock().await;
            rooms.entry(room_id.clone()).or_default().clone()
        };
        slot.lock_owned().await
    }

    /// Drop the room's slot once nobody holds or waits on it.
    pub async fn release(&self, room_id: &RoomId) {
        let mut rooms = self.rooms.lock().await;
        if let Some(slot) = rooms.get(room_id) {
            // the map's own reference is the only one left
            if Arc::strong_count(slot) == 1 {
                rooms.remove(room_id);
            }
        }
    }

    pub async fn tracked_rooms(&self) -> usize {
        self.rooms.lock().await.len()
    }
}
