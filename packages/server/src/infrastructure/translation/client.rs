//! Translator Client
//!
//! Wraps the upstream provider with a request budget and a hard timeout.
//! Owns no state besides the rate-limit windows.

use std::{sync::Arc, time::Duration};

use crate::domain::{Language, TranslationError, TranslationProvider};

use super::rate_limit::RateLimiter;

pub struct TranslatorClient {
    provider: Arc<dyn TranslationProvider>,
    limiter: RateLimiter,
    timeout: Duration,
}

impl TranslatorClient {
    pub fn new(
        provider: Arc<dyn TranslationProvider>,
        limiter: RateLimiter,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            limiter,
            timeout,
        }
    }

    /// Translate `text` into `target`, surfacing the failure reason.
    ///
    /// Same-language requests pass through without touching the budget or the provider.
    /// Over-budget requests fail fast with `RateLimited`.
    pub async fn try_translate(
        &self,
        identity: &str,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslationError> {
        if source == target {
            return Ok(text.to_string());
        }

        if !self.limiter.try_acquire(identity).await {
            return Err(TranslationError::RateLimited(identity.to_string()));
        }

        match tokio::time::timeout(self.timeout, self.provider.translate(text, source, target))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(TranslationError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockTranslationProvider;
    use async_trait::async_trait;
    use mockall::predicate::eq;

    struct SlowProvider;

    #[async_trait]
    impl TranslationProvider for SlowProvider {
        async fn translate(
            &self,
            text: &str,
            _source: Language,
            _target: Language,
        ) -> Result<String, TranslationError> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(format!("late {}", text))
        }
    }

    fn create_client(provider: Arc<dyn TranslationProvider>, max_requests: u32) -> TranslatorClient {
        TranslatorClient::new(
            provider,
            RateLimiter::new(max_requests, Duration::from_secs(60)),
            Duration::from_millis(100),
        )
    }

    #[tokio::test]
    async fn test_translate_calls_provider() {
        // テスト項目: 異なる言語間の翻訳ではプロバイダが呼ばれる
        // given (前提条件):
        let mut provider = MockTranslationProvider::new();
        provider
            .expect_translate()
            .with(eq("How are you?"), eq(Language::En), eq(Language::He))
            .times(1)
            .returning(|_, _, _| Ok("מה שלומך?".to_string()));
        let client = create_client(Arc::new(provider), 10);

        // when (操作):
        let result = client
            .try_translate("room-1", "How are you?", Language::En, Language::He)
            .await;

        // then (期待する結果):
        assert_eq!(result, Ok("מה שלומך?".to_string()));
    }

    #[tokio::test]
    async fn test_same_language_passes_through_without_provider() {
        // テスト項目: 同一言語はプロバイダを呼ばずにそのまま返す
        // given (前提条件):
        let mut provider = MockTranslationProvider::new();
        provider.expect_translate().times(0);
        let client = create_client(Arc::new(provider), 1);

        // when (操作):
        let first = client
            .try_translate("room-1", "Hola", Language::Es, Language::Es)
            .await;
        let second = client
            .try_translate("room-1", "Hola", Language::Es, Language::Es)
            .await;

        // then (期待する結果): 予算も消費しない
        assert_eq!(first, Ok("Hola".to_string()));
        assert_eq!(second, Ok("Hola".to_string()));
    }

    #[tokio::test]
    async fn test_over_budget_fails_fast_without_provider() {
        // テスト項目: 予算超過時はプロバイダを呼ばずに RateLimited を返す
        // given (前提条件):
        let mut provider = MockTranslationProvider::new();
        provider
            .expect_translate()
            .times(1)
            .returning(|text, _, _| Ok(format!("[he] {}", text)));
        let client = create_client(Arc::new(provider), 1);
        client
            .try_translate("room-1", "one", Language::En, Language::He)
            .await
            .unwrap();

        // when (操作):
        let result = client
            .try_translate("room-1", "two", Language::En, Language::He)
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(TranslationError::RateLimited("room-1".to_string()))
        );
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        // テスト項目: プロバイダが時間切れになると Timeout を返す
        // given (前提条件):
        let client = create_client(Arc::new(SlowProvider), 10);

        // when (操作):
        let started = std::time::Instant::now();
        let result = client
            .try_translate("room-1", "Hello", Language::En, Language::Fr)
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(TranslationError::Timeout(Duration::from_millis(100)))
        );
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
