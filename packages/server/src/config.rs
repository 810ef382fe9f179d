//! Server configuration
//!
//! CLI flags with environment-variable fallbacks. Validated once at startup.

use std::time::Duration;

use clap::Parser;
use thiserror::Error;

/// Below this the upstream provider routinely times out on longer messages.
const RECOMMENDED_MIN_TRANSLATION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("temperature must be within [0, 1], got {0}")]
    TemperatureOutOfRange(f32),

    #[error("redis url must start with redis:// or rediss://, got '{0}'")]
    InvalidRedisUrl(String),
}

#[derive(Parser, Debug, Clone)]
#[command(name = "tsuyaku-server")]
#[command(about = "Multilingual chat relay with cached machine translation", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "TSUYAKU_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "TSUYAKU_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Redis URL for room state and the persistent translation cache.
    /// Without it an in-process store is used.
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Upper bound for one store operation, including connect (milliseconds)
    #[arg(long, env = "TSUYAKU_STORE_TIMEOUT_MS", default_value_t = 2000)]
    pub store_timeout_ms: u64,

    /// Upper bound for one upstream translation call (seconds)
    #[arg(long, env = "TSUYAKU_TRANSLATION_TIMEOUT_SECS", default_value_t = 10)]
    pub translation_timeout_secs: u64,

    /// Translation requests allowed per room per window
    #[arg(long, env = "TSUYAKU_RATE_LIMIT_MAX", default_value_t = 30)]
    pub rate_limit_max_requests: u32,

    /// Rate-limit window (seconds)
    #[arg(long, env = "TSUYAKU_RATE_LIMIT_WINDOW_SECS", default_value_t = 60)]
    pub rate_limit_window_secs: u64,

    /// Entries kept in the in-process translation cache
    #[arg(long, env = "TSUYAKU_LOCAL_CACHE_CAPACITY", default_value_t = 1000)]
    pub local_cache_capacity: usize,

    /// Lifetime of persistent translation cache entries (seconds)
    #[arg(long, env = "TSUYAKU_TRANSLATION_TTL_SECS", default_value_t = 86_400)]
    pub translation_ttl_secs: u64,

    /// Anthropic API key. Without it messages are relayed untranslated.
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: Option<String>,

    #[arg(long, env = "ANTHROPIC_MODEL", default_value = "claude-3-haiku-20240307")]
    pub anthropic_model: String,

    #[arg(long, env = "ANTHROPIC_MAX_TOKENS", default_value_t = 1000)]
    pub anthropic_max_tokens: u32,

    #[arg(long, env = "ANTHROPIC_TEMPERATURE", default_value_t = 0.1)]
    pub anthropic_temperature: f32,

    #[arg(long, env = "ANTHROPIC_BASE_URL", default_value = "https://api.anthropic.com")]
    pub anthropic_base_url: String,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("store_timeout_ms", self.store_timeout_ms),
            ("translation_timeout_secs", self.translation_timeout_secs),
            (
                "rate_limit_max_requests",
                u64::from(self.rate_limit_max_requests),
            ),
            ("rate_limit_window_secs", self.rate_limit_window_secs),
            ("local_cache_capacity", self.local_cache_capacity as u64),
            ("translation_ttl_secs", self.translation_ttl_secs),
            ("anthropic_max_tokens", u64::from(self.anthropic_max_tokens)),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::NotPositive(name));
        }

        if !(0.0..=1.0).contains(&self.anthropic_temperature) {
            return Err(ConfigError::TemperatureOutOfRange(
                self.anthropic_temperature,
            ));
        }

        if let Some(url) = &self.redis_url {
            if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                return Err(ConfigError::InvalidRedisUrl(url.clone()));
            }
        }

        if self.translation_timeout() < RECOMMENDED_MIN_TRANSLATION_TIMEOUT {
            tracing::warn!(
                "Translation timeout of {:?} is below the recommended {:?}; expect more untranslated messages",
                self.translation_timeout(),
                RECOMMENDED_MIN_TRANSLATION_TIMEOUT
            );
        }

        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn translation_timeout(&self) -> Duration {
        Duration::from_secs(self.translation_timeout_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn translation_ttl(&self) -> Duration {
        Duration::from_secs(self.translation_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ServerConfig {
        let mut argv = vec!["tsuyaku-server"];
        argv.extend_from_slice(args);
        ServerConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        // テスト項目: 既定値で検証を通る
        // given (前提条件):
        let config = parse(&[]);

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert_eq!(result, Ok(()));
        assert_eq!(config.port, 8000);
        assert_eq!(config.rate_limit_max_requests, 30);
        assert_eq!(config.rate_limit_window(), Duration::from_secs(60));
        assert_eq!(config.local_cache_capacity, 1000);
        assert_eq!(config.translation_ttl(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_zero_limits_are_rejected() {
        // テスト項目: 0 の上限値は拒否される
        // given (前提条件):
        let config = parse(&["--rate-limit-max-requests", "0"]);

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ConfigError::NotPositive("rate_limit_max_requests"))
        );
    }

    #[test]
    fn test_temperature_out_of_range_is_rejected() {
        // テスト項目: 範囲外の temperature は拒否される
        // given (前提条件):
        let config = parse(&["--anthropic-temperature", "1.5"]);

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert_eq!(result, Err(ConfigError::TemperatureOutOfRange(1.5)));
    }

    #[test]
    fn test_redis_url_scheme_is_checked() {
        // テスト項目: redis:// / rediss:// 以外の URL は拒否される
        // given (前提条件):
        let bad = parse(&["--redis-url", "http://localhost:6379"]);
        let good = parse(&["--redis-url", "rediss://cache.internal:6380/0"]);

        // when (操作) / then (期待する結果):
        assert!(matches!(bad.validate(), Err(ConfigError::InvalidRedisUrl(_))));
        assert_eq!(good.validate(), Ok(()));
    }

    #[test]
    fn test_short_translation_timeout_is_accepted() {
        // テスト項目: 推奨値より短い翻訳タイムアウトは警告のみで受け付ける
        // given (前提条件):
        let config = parse(&["--translation-timeout-secs", "2"]);

        // when (操作):
        let result = config.validate();

        // then (期待する結果):
        assert_eq!(result, Ok(()));
        assert_eq!(config.translation_timeout(), Duration::from_secs(2));
    }
}
