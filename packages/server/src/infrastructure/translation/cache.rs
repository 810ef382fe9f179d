//! Translation Cache
//!
//! Two tiers keyed by (verbatim text, source, target):
//!
//! 1. persistent tier (`TranslationStore`, best-effort)
//! 2. local tier, bounded, oldest-inserted evicted first
//!
//! On a miss in both tiers the translator is invoked and a successful result is
//! written through to both. Degraded results (original text after a failure) are
//! never cached. The local lock is held only for the map read-modify-write,
//! never across a store or translator call.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use tokio::sync::Mutex;

use crate::{
    domain::{CacheKey, Language, TranslationStore},
    infrastructure::stats::RelayStats,
};

use super::client::TranslatorClient;

/// Bounded FIFO map
struct LocalTier {
    capacity: usize,
    entries: HashMap<CacheKey, String>,
    order: VecDeque<CacheKey>,
}

impl LocalTier {
    fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&self, key: &CacheKey) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn insert(&mut self, key: CacheKey, value: String) {
        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = value;
            return;
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

pub struct TranslationCache {
    store: Arc<dyn TranslationStore>,
    local: Mutex<LocalTier>,
    translator: Arc<TranslatorClient>,
    stats: Arc<RelayStats>,
}

impl TranslationCache {
    pub fn new(
        store: Arc<dyn TranslationStore>,
        translator: Arc<TranslatorClient>,
        stats: Arc<RelayStats>,
        local_capacity: usize,
    ) -> Self {
        Self {
            store,
            local: Mutex::new(LocalTier::new(local_capacity)),
            translator,
            stats,
        }
    }

    /// Look up a translation, translating on a miss.
    ///
    /// Returns the text and whether it came from a cache tier. `identity` is the
    /// rate-limit budget charged if the translator has to be called.
    pub async fn get_or_translate(
        &self,
        identity: &str,
        text: &str,
        source: Language,
        target: Language,
    ) -> (String, bool) {
        // pass-through, not a cache entry
        if source == target {
            return (text.to_string(), false);
        }

        let key = CacheKey::new(text, source, target);

        match self.store.get_translation(&key).await {
            Ok(Some(translated)) => {
                self.local.lock().await.insert(key, translated.clone());
                self.stats.record_cache_hit();
                tracing::debug!("Persistent cache hit for {} -> {}", source, target);
                return (translated, true);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!("Persistent cache unavailable, using local tier: {}", e);
            }
        }

        let local_hit = self.local.lock().await.get(&key);
        if let Some(translated) = local_hit {
            self.stats.record_cache_hit();
            tracing::debug!("Local cache hit for {} -> {}", source, target);
            return (translated, true);
        }

        self.stats.record_cache_miss();
        tracing::debug!("Cache miss for {} -> {}, calling translator", source, target);

        match self
            .translator
            .try_translate(identity, text, source, target)
            .await
        {
            Ok(translated) => {
                self.local.lock().await.insert(key.clone(), translated.clone());
                if let Err(e) = self.store.put_translation(&key, &translated).await {
                    tracing::warn!("Failed to write translation to persistent cache: {}", e);
                }
                (translated, false)
            }
            Err(e) => {
                self.stats.record_translation_failure();
                tracing::warn!(
                    "Translation {} -> {} failed, delivering original text: {}",
                    source,
                    target,
                    e
                );
                (text.to_string(), false)
            }
        }
    }

    /// Number of entries in the local tier
    pub async fn local_len(&self) -> usize {
        self.local.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{MockTranslationProvider, TranslationError},
        infrastructure::{store::InMemoryStore, translation::RateLimiter},
    };
    use std::time::Duration;

    fn create_cache(
        provider: MockTranslationProvider,
        store: Arc<InMemoryStore>,
        capacity: usize,
    ) -> (TranslationCache, Arc<RelayStats>) {
        let stats = Arc::new(RelayStats::new());
        let translator = Arc::new(TranslatorClient::new(
            Arc::new(provider),
            RateLimiter::new(100, Duration::from_secs(60)),
            Duration::from_secs(5),
        ));
        let cache = TranslationCache::new(store, translator, stats.clone(), capacity);
        (cache, stats)
    }

    #[test]
    fn test_local_tier_evicts_oldest_inserted_first() {
        // テスト項目: 容量超過時は最も古く挿入されたエントリが追い出される
        // given (前提条件):
        let mut tier = LocalTier::new(2);
        let a = CacheKey::new("a", Language::En, Language::He);
        let b = CacheKey::new("b", Language::En, Language::He);
        let c = CacheKey::new("c", Language::En, Language::He);
        tier.insert(a.clone(), "A".to_string());
        tier.insert(b.clone(), "B".to_string());
        // 参照しても順序は変わらない（FIFO）
        assert_eq!(tier.get(&a), Some("A".to_string()));

        // when (操作):
        tier.insert(c.clone(), "C".to_string());

        // then (期待する結果):
        assert_eq!(tier.len(), 2);
        assert_eq!(tier.get(&a), None);
        assert_eq!(tier.get(&b), Some("B".to_string()));
        assert_eq!(tier.get(&c), Some("C".to_string()));
    }

    #[test]
    fn test_local_tier_reinsert_updates_without_duplicating() {
        // テスト項目: 同じキーの再挿入は値を更新するだけで順序キューを増やさない
        // given (前提条件):
        let mut tier = LocalTier::new(2);
        let a = CacheKey::new("a", Language::En, Language::He);
        let b = CacheKey::new("b", Language::En, Language::He);

        // when (操作):
        tier.insert(a.clone(), "A1".to_string());
        tier.insert(a.clone(), "A2".to_string());
        tier.insert(b.clone(), "B".to_string());

        // then (期待する結果):
        assert_eq!(tier.len(), 2);
        assert_eq!(tier.order.len(), 2);
        assert_eq!(tier.get(&a), Some("A2".to_string()));
    }

    #[tokio::test]
    async fn test_second_identical_request_is_a_cache_hit() {
        // テスト項目: 同じ (本文, 原文言語, 翻訳先) の 2 回目はキャッシュヒットで翻訳器を呼ばない
        // given (前提条件):
        let mut provider = MockTranslationProvider::new();
        provider
            .expect_translate()
            .times(1)
            .returning(|_, _, _| Ok("מה שלומך?".to_string()));
        let store = Arc::new(InMemoryStore::new());
        let (cache, stats) = create_cache(provider, store.clone(), 10);

        // when (操作):
        let first = cache
            .get_or_translate("room-1", "How are you?", Language::En, Language::He)
            .await;
        let second = cache
            .get_or_translate("room-1", "How are you?", Language::En, Language::He)
            .await;

        // then (期待する結果):
        assert_eq!(first, ("מה שלומך?".to_string(), false));
        assert_eq!(second, ("מה שלומך?".to_string(), true));
        let snapshot = stats.snapshot();
        assert_eq!(snapshot.cache_misses, 1);
        assert_eq!(snapshot.cache_hits, 1);
        // 両方の層に書き込まれている
        assert_eq!(store.translation_count().await, 1);
        assert_eq!(cache.local_len().await, 1);
    }

    #[tokio::test]
    async fn test_text_is_compared_verbatim() {
        // テスト項目: 大文字小文字・空白が異なる本文は別のキーとして扱われる
        // given (前提条件):
        let mut provider = MockTranslationProvider::new();
        provider
            .expect_translate()
            .times(3)
            .returning(|text, _, _| Ok(format!("[he] {}", text)));
        let (cache, _stats) = create_cache(provider, Arc::new(InMemoryStore::new()), 10);

        // when (操作):
        let (_, hit1) = cache
            .get_or_translate("room-1", "Hello", Language::En, Language::He)
            .await;
        let (_, hit2) = cache
            .get_or_translate("room-1", "hello", Language::En, Language::He)
            .await;
        let (_, hit3) = cache
            .get_or_translate("room-1", "Hello ", Language::En, Language::He)
            .await;

        // then (期待する結果):
        assert!(!hit1 && !hit2 && !hit3);
    }

    #[tokio::test]
    async fn test_local_tier_serves_hits_while_store_is_unreachable() {
        // テスト項目: 永続層が到達不能でもローカル層でヒットする
        // given (前提条件):
        let mut provider = MockTranslationProvider::new();
        provider
            .expect_translate()
            .times(1)
            .returning(|_, _, _| Ok("Bonjour".to_string()));
        let store = Arc::new(InMemoryStore::new());
        store.set_reachable(false);
        let (cache, stats) = create_cache(provider, store, 10);

        // when (操作):
        let first = cache
            .get_or_translate("room-1", "Hello", Language::En, Language::Fr)
            .await;
        let second = cache
            .get_or_translate("room-1", "Hello", Language::En, Language::Fr)
            .await;

        // then (期待する結果):
        assert_eq!(first, ("Bonjour".to_string(), false));
        assert_eq!(second, ("Bonjour".to_string(), true));
        assert_eq!(stats.snapshot().cache_hits, 1);
    }

    #[tokio::test]
    async fn test_persistent_hit_skips_translator() {
        // テスト項目: 永続層にある訳文は翻訳器を呼ばずに返す
        // given (前提条件):
        let mut provider = MockTranslationProvider::new();
        provider.expect_translate().times(0);
        let store = Arc::new(InMemoryStore::new());
        store
            .put_translation(
                &CacheKey::new("Thanks", Language::En, Language::De),
                "Danke",
            )
            .await
            .unwrap();
        let (cache, _stats) = create_cache(provider, store, 10);

        // when (操作):
        let result = cache
            .get_or_translate("room-1", "Thanks", Language::En, Language::De)
            .await;

        // then (期待する結果): ローカル層にも取り込まれる
        assert_eq!(result, ("Danke".to_string(), true));
        assert_eq!(cache.local_len().await, 1);
    }

    #[tokio::test]
    async fn test_failed_translation_is_not_cached() {
        // テスト項目: 翻訳失敗時は原文を返し、キャッシュには書き込まない
        // given (前提条件):
        let mut provider = MockTranslationProvider::new();
        provider
            .expect_translate()
            .times(2)
            .returning(|_, _, _| Err(TranslationError::Upstream("overloaded".to_string())));
        let store = Arc::new(InMemoryStore::new());
        let (cache, stats) = create_cache(provider, store.clone(), 10);

        // when (操作):
        let first = cache
            .get_or_translate("room-1", "Hello", Language::En, Language::Ko)
            .await;
        let second = cache
            .get_or_translate("room-1", "Hello", Language::En, Language::Ko)
            .await;

        // then (期待する結果):
        assert_eq!(first, ("Hello".to_string(), false));
        assert_eq!(second, ("Hello".to_string(), false));
        assert_eq!(store.translation_count().await, 0);
        assert_eq!(cache.local_len().await, 0);
        assert_eq!(stats.snapshot().translation_failures, 2);
    }

    #[tokio::test]
    async fn test_same_language_is_not_cached_or_counted() {
        // テスト項目: 同一言語はキャッシュにも統計にも影響しない
        // given (前提条件):
        let mut provider = MockTranslationProvider::new();
        provider.expect_translate().times(0);
        let (cache, stats) = create_cache(provider, Arc::new(InMemoryStore::new()), 10);

        // when (操作):
        let result = cache
            .get_or_translate("room-1", "Hi", Language::En, Language::En)
            .await;

        // then (期待する結果):
        assert_eq!(result, ("Hi".to_string(), false));
        assert_eq!(cache.local_len().await, 0);
        assert_eq!(stats.snapshot(), Default::default());
    }
}
