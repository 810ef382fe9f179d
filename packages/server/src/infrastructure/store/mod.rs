//! 永続ストアの実装
//!
//! - `redis`: Redis を使った実装（本番用）
//! - `inmemory`: プロセス内の実装（開発・テスト用、障害を模擬できる）

pub mod inmemory;
pub mod redis;

pub use inmemory::InMemoryStore;
pub use redis::RedisStore;
