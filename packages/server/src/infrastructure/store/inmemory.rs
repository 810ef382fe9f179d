//! InMemory Store 実装
//!
//! Redis の代わりにプロセス内の HashMap を使う。`set_reachable(false)` で
//! ストア障害を模擬でき、Registry / Cache のフォールバック経路のテストに使う。

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    CacheKey, Client, ClientId, Language, MembershipStore, RoomId, StoreError, StoreHealth,
    TranslationStore,
};

#[derive(Default)]
struct InMemoryData {
    /// room_id -> (client_id -> language)
    rooms: HashMap<RoomId, BTreeMap<ClientId, Language>>,
    translations: HashMap<CacheKey, String>,
}

/// インメモリの永続ストア
pub struct InMemoryStore {
    data: Mutex<InMemoryData>,
    reachable: AtomicBool,
    /// 到達不能時を含む操作回数（テスト用）
    operations: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            data: Mutex::new(InMemoryData::default()),
            reachable: AtomicBool::new(true),
            operations: AtomicUsize::new(0),
        }
    }

    /// ストア障害を模擬する
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    pub async fn translation_count(&self) -> usize {
        self.data.lock().await.translations.len()
    }

    fn check(&self) -> Result<(), StoreError> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unreachable(
                "in-memory store is switched off".to_string(),
            ))
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MembershipStore for InMemoryStore {
    async fn add_member(&self, client: &Client) -> Result<(), StoreError> {
        self.check()?;
        let mut data = self.data.lock().await;
        data.rooms
            .entry(client.room_id.clone())
            .or_default()
            .insert(client.id.clone(), client.language);
        Ok(())
    }

    async fn remove_member(
        &self,
        room_id: &RoomId,
        client_id: &ClientId,
    ) -> Result<(), StoreError> {
        self.check()?;
        let mut data = self.data.lock().await;
        if let Some(members) = data.rooms.get_mut(room_id) {
            members.remove(client_id);
            if members.is_empty() {
                data.rooms.remove(room_id);
            }
        }
        Ok(())
    }

    async fn room_languages(&self, room_id: &RoomId) -> Result<BTreeSet<Language>, StoreError> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data
            .rooms
            .get(room_id)
            .map(|members| members.values().copied().collect())
            .unwrap_or_default())
    }

    async fn replace_room(&self, room_id: &RoomId, members: &[Client]) -> Result<(), StoreError> {
        self.check()?;
        let mut data = self.data.lock().await;
        if members.is_empty() {
            data.rooms.remove(room_id);
        } else {
            let entries = members
                .iter()
                .map(|c| (c.id.clone(), c.language))
                .collect();
            data.rooms.insert(room_id.clone(), entries);
        }
        Ok(())
    }

    async fn clear_rooms(&self) -> Result<(), StoreError> {
        self.check()?;
        self.data.lock().await.rooms.clear();
        Ok(())
    }
}

#[async_trait]
impl TranslationStore for InMemoryStore {
    async fn get_translation(&self, key: &CacheKey) -> Result<Option<String>, StoreError> {
        self.check()?;
        let data = self.data.lock().await;
        Ok(data.translations.get(key).cloned())
    }

    async fn put_translation(&self, key: &CacheKey, translated: &str) -> Result<(), StoreError> {
        self.check()?;
        let mut data = self.data.lock().await;
        data.translations
            .insert(key.clone(), translated.to_string());
        Ok(())
    }
}

#[async_trait]
impl StoreHealth for InMemoryStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        self.check()?;
        Ok(Duration::ZERO)
    }
}
