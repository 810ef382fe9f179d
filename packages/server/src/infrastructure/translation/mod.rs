//! Translation pipeline
//!
//! `TranslationCache` (persistent tier → local FIFO tier) → `TranslatorClient`
//! (rate limit + timeout) → `TranslationProvider` (upstream).

pub mod anthropic;
pub mod cache;
pub mod client;
pub mod rate_limit;

pub use anthropic::{AnthropicConfig, AnthropicProvider, UnavailableProvider};
pub use cache::TranslationCache;
pub use client::TranslatorClient;
pub use rate_limit::RateLimiter;
