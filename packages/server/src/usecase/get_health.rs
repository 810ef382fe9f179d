//! UseCase: ヘルスレポート
//!
//! 読み取り専用。永続ストアへの ping 以外に副作用はない。

use std::{sync::Arc, time::Duration};

use tsuyaku_shared::time::Clock;

use crate::{
    domain::{MessagePusher, RoomRepository, StoreHealth, Timestamp},
    infrastructure::{
        stats::{RelayStats, StatsSnapshot},
        translation::TranslationCache,
    },
};

/// ある時点のヘルス情報
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub timestamp: Timestamp,
    pub store_backend: &'static str,
    /// 到達できなければ `None`
    pub store_latency: Option<Duration>,
    pub stats: StatsSnapshot,
    pub local_cache_entries: usize,
    pub active_rooms: usize,
    pub active_connections: usize,
}

impl HealthReport {
    pub fn is_degraded(&self) -> bool {
        self.store_latency.is_none()
    }
}

pub struct GetHealthUseCase {
    store: Arc<dyn StoreHealth>,
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    cache: Arc<TranslationCache>,
    stats: Arc<RelayStats>,
    clock: Arc<dyn Clock>,
}

impl GetHealthUseCase {
    pub fn new(
        store: Arc<dyn StoreHealth>,
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        cache: Arc<TranslationCache>,
        stats: Arc<RelayStats>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            repository,
            message_pusher,
            cache,
            stats,
            clock,
        }
    }

    pub async fn execute(&self) -> HealthReport {
        let store_latency = match self.store.ping().await {
            Ok(latency) => Some(latency),
            Err(e) => {
                tracing::warn!(
                    "Health check: {} store unreachable: {}",
                    self.store.backend_name(),
                    e
                );
                None
            }
        };

        HealthReport {
            timestamp: Timestamp::new(self.clock.now_millis()),
            store_backend: self.store.backend_name(),
            store_latency,
            stats: self.stats.snapshot(),
            local_cache_entries: self.cache.local_len().await,
            active_rooms: self.repository.count_rooms().await,
            active_connections: self.message_pusher.count_clients().await,
        }
    }
}
