//! 翻訳まわりの trait とキャッシュキー

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use super::{Language, StoreError, TranslationError};

/// 翻訳キャッシュのキー
///
/// 本文は大文字小文字・空白を含めて完全一致で比較する。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub text: String,
    pub source: Language,
    pub target: Language,
}

impl CacheKey {
    pub fn new(text: impl Into<String>, source: Language, target: Language) -> Self {
        Self {
            text: text.into(),
            source,
            target,
        }
    }
}

/// 外部の翻訳プロバイダ
///
/// 推定された原文の言語に関係なく、必ず `target` に翻訳すること。
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslationError>;
}

/// 翻訳キャッシュの永続層
#[async_trait]
pub trait TranslationStore: Send + Sync {
    async fn get_translation(&self, key: &CacheKey) -> Result<Option<String>, StoreError>;

    async fn put_translation(&self, key: &CacheKey, translated: &str) -> Result<(), StoreError>;
}
