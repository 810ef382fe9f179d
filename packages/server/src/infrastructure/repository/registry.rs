//! Room Registry 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//!
//! ## ミラーと永続ストア
//!
//! 参加・退出は、まずプロセス内のミラーに書き込み（ロックはこの書き込みの間だけ保持）、
//! その後で永続ストアにベストエフォートで書き込みます。ストアのエラーはログに残すだけで
//! 呼び出し側には返しません。
//!
//! 正はミラーで、`languages_in_room` は常にミラーの参加者から言語集合を作ります。
//! ストアの読み出しは写しの検査にだけ使い、障害中に取りこぼした退出などでミラーと
//! 食い違っていれば、到達できた時点でミラーの内容で書き戻します。

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tsuyaku_shared::time::Clock;

use crate::domain::{
    Client, ClientId, DisplayName, Language, MembershipStore, RegistryError, RoomId,
    RoomRepository, Timestamp,
};

/// プロセス内のミラー
#[derive(Default)]
struct Mirror {
    /// room_id -> 参加順のクライアント
    rooms: HashMap<RoomId, Vec<Client>>,
    /// client_id -> 所属ルーム
    index: HashMap<ClientId, RoomId>,
}

/// ルーム参加状態の唯一の所有者
pub struct RoomRegistry {
    mirror: Mutex<Mirror>,
    store: Arc<dyn MembershipStore>,
    clock: Arc<dyn Clock>,
}

impl RoomRegistry {
    pub fn new(store: Arc<dyn MembershipStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            mirror: Mutex::new(Mirror::default()),
            store,
            clock,
        }
    }

    /// ストアの写しがミラーと食い違っていれば書き戻す
    async fn reconcile(
        &self,
        room_id: &RoomId,
        members: &[Client],
        languages: &BTreeSet<Language>,
    ) {
        let durable = match self.store.room_languages(room_id).await {
            Ok(durable) => durable,
            Err(e) => {
                tracing::warn!(
                    "Durable store unavailable, skipping sync for room '{}': {}",
                    room_id,
                    e
                );
                return;
            }
        };
        if &durable == languages {
            return;
        }

        tracing::info!(
            "Durable languages for room '{}' diverge from mirror ({:?} vs {:?}), rewriting",
            room_id,
            durable,
            languages
        );
        if let Err(e) = self.store.replace_room(room_id, members).await {
            tracing::warn!("Failed to rewrite durable room '{}': {}", room_id, e);
        }
    }
}

#[async_trait]
impl RoomRepository for RoomRegistry {
    async fn join(
        &self,
        room_id: RoomId,
        client_id: ClientId,
        display_name: DisplayName,
        language: Language,
    ) -> Result<Client, RegistryError> {
        let client = Client::new(
            client_id,
            room_id,
            display_name,
            language,
            Timestamp::new(self.clock.now_millis()),
        );

        // 1. ミラーに書き込み
        {
            let mut mirror = self.mirror.lock().await;
            if let Some(existing_room) = mirror.index.get(&client.id) {
                return Err(RegistryError::AlreadyJoined {
                    client_id: client.id.as_str().to_string(),
                    room_id: existing_room.as_str().to_string(),
                });
            }
            mirror
                .index
                .insert(client.id.clone(), client.room_id.clone());
            mirror
                .rooms
                .entry(client.room_id.clone())
                .or_default()
                .push(client.clone());
        }

        // 2. 永続ストアにベストエフォートで書き込み
        if let Err(e) = self.store.add_member(&client).await {
            tracing::warn!(
                "Durable store unavailable, '{}' tracked in mirror only: {}",
                client.id,
                e
            );
        }

        tracing::debug!(
            "Client '{}' joined room '{}' ({})",
            client.id,
            client.room_id,
            client.language
        );
        Ok(client)
    }

    async fn leave(&self, client_id: &ClientId) -> Option<Client> {
        let removed = {
            let mut mirror = self.mirror.lock().await;
            let room_id = mirror.index.remove(client_id)?;
            let mut removed = None;
            let mut room_is_empty = false;
            if let Some(members) = mirror.rooms.get_mut(&room_id) {
                if let Some(pos) = members.iter().position(|c| &c.id == client_id) {
                    removed = Some(members.remove(pos));
                }
                room_is_empty = members.is_empty();
            }
            if room_is_empty {
                mirror.rooms.remove(&room_id);
                tracing::info!("Room '{}' is empty and was discarded", room_id);
            }
            removed
        }?;

        if let Err(e) = self
            .store
            .remove_member(&removed.room_id, &removed.id)
            .await
        {
            tracing::warn!(
                "Durable store unavailable, '{}' removed from mirror only: {}",
                removed.id,
                e
            );
        }

        Some(removed)
    }

    async fn languages_in_room(&self, room_id: &RoomId) -> BTreeSet<Language> {
        let members = self.members(room_id).await;
        let languages: BTreeSet<Language> = members.iter().map(|c| c.language).collect();
        self.reconcile(room_id, &members, &languages).await;
        languages
    }

    async fn members(&self, room_id: &RoomId) -> Vec<Client> {
        let mirror = self.mirror.lock().await;
        mirror.rooms.get(room_id).cloned().unwrap_or_default()
    }

    async fn find_client(&self, client_id: &ClientId) -> Option<Client> {
        let mirror = self.mirror.lock().await;
        let room_id = mirror.index.get(client_id)?;
        mirror
            .rooms
            .get(room_id)?
            .iter()
            .find(|c| &c.id == client_id)
            .cloned()
    }

    async fn count_rooms(&self) -> usize {
        self.mirror.lock().await.rooms.len()
    }

    async fn count_clients(&self) -> usize {
        self.mirror.lock().await.index.len()
    }
}
