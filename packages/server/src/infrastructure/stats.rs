//! Relay statistics
//!
//! Read-only side channel for the health endpoint. Counters only ever grow.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the translation cache and the relay use cases
#[derive(Debug, Default)]
pub struct RelayStats {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    translation_failures: AtomicU64,
    messages_relayed: AtomicU64,
}

/// Point-in-time copy of [`RelayStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub translation_failures: u64,
    pub messages_relayed: u64,
}

impl RelayStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_translation_failure(&self) {
        self.translation_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message_relayed(&self) {
        self.messages_relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            translation_failures: self.translation_failures.load(Ordering::Relaxed),
            messages_relayed: self.messages_relayed.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_recorded_events() {
        // テスト項目: 記録したイベント数がスナップショットに反映される
        // given (前提条件):
        let stats = RelayStats::new();

        // when (操作):
        stats.record_cache_hit();
        stats.record_cache_hit();
        stats.record_cache_miss();
        stats.record_translation_failure();
        stats.record_message_relayed();
        let snapshot = stats.snapshot();

        // then (期待する結果):
        assert_eq!(
            snapshot,
            StatsSnapshot {
                cache_hits: 2,
                cache_misses: 1,
                translation_failures: 1,
                messages_relayed: 1,
            }
        );
    }
}
