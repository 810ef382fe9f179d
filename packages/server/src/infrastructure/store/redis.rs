//! Redis Store 実装
//!
//! ## 接続の扱い
//!
//! 1 つの論理操作ごとに新しい多重化コネクションを開き、操作が終わったら
//! （成功・タイムアウト・エラーのいずれでも）破棄する。コネクションを
//! 並行する操作間で共有しない。
//!
//! ## キー構成
//!
//! ```text
//! room:{room_id}:users                 SET   client_id
//! room:{room_id}:languages             HASH  client_id -> language code
//! user:{client_id}                     HASH  username / language / room_id / joined_at
//! translation:{src}:{tgt}:{sha256}     STRING 訳文（TTL 付き）
//! ```
//!
//! ルーム参加情報（`room:*` と `user:*`）はミラーの写しなので、起動時に `clear_rooms` で消す。

use std::{
    collections::BTreeSet,
    future::Future,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use redis::{RedisError, RedisResult, aio::MultiplexedConnection};
use sha2::{Digest, Sha256};

use crate::domain::{
    CacheKey, Client, ClientId, Language, MembershipStore, RoomId, StoreError, StoreHealth,
    TranslationStore,
};

fn users_key(room_id: &RoomId) -> String {
    format!("room:{}:users", room_id.as_str())
}

fn languages_key(room_id: &RoomId) -> String {
    format!("room:{}:languages", room_id.as_str())
}

fn user_key(client_id: &str) -> String {
    format!("user:{}", client_id)
}

/// 起動時に消すルーム参加情報のキー
const MEMBERSHIP_PATTERNS: [&str; 2] = ["room:*", "user:*"];

/// 参加者 1 人分の書き込みをパイプラインに積む
fn push_member(pipe: &mut redis::Pipeline, client: &Client) {
    pipe.cmd("SADD")
        .arg(users_key(&client.room_id))
        .arg(client.id.as_str())
        .ignore()
        .cmd("HSET")
        .arg(languages_key(&client.room_id))
        .arg(client.id.as_str())
        .arg(client.language.code())
        .ignore()
        .cmd("HSET")
        .arg(user_key(client.id.as_str()))
        .arg("username")
        .arg(client.display_name.as_str())
        .arg("language")
        .arg(client.language.code())
        .arg("room_id")
        .arg(client.room_id.as_str())
        .arg("joined_at")
        .arg(client.joined_at.value())
        .ignore();
}

fn translation_key(key: &CacheKey) -> String {
    let digest = Sha256::digest(key.text.as_bytes());
    format!(
        "translation:{}:{}:{:x}",
        key.source.code(),
        key.target.code(),
        digest
    )
}

fn map_redis_error(error: RedisError) -> StoreError {
    if error.is_io_error() || error.is_connection_refusal() || error.is_connection_dropped() {
        StoreError::Unreachable(error.to_string())
    } else {
        StoreError::Backend(error.to_string())
    }
}

/// Redis を使った永続ストア
pub struct RedisStore {
    client: redis::Client,
    /// 接続＋操作全体にかける上限時間
    op_timeout: Duration,
    /// 翻訳キャッシュの TTL
    translation_ttl: Duration,
}

impl RedisStore {
    /// URL を検証してストアを作る（この時点では接続しない）
    pub fn open(
        url: &str,
        op_timeout: Duration,
        translation_ttl: Duration,
    ) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self {
            client,
            op_timeout,
            translation_ttl,
        })
    }

    /// 新しいコネクション上で 1 つの論理操作を実行する
    ///
    /// コネクションは `op` に move され、future の完了（またはタイムアウトによる破棄）で閉じる。
    async fn run<T, F, Fut>(&self, op: F) -> Result<T, StoreError>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        let work = async {
            let con = self
                .client
                .get_multiplexed_async_connection()
                .await
                .map_err(map_redis_error)?;
            op(con).await.map_err(map_redis_error)
        };

        match tokio::time::timeout(self.op_timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.op_timeout)),
        }
    }
}

#[async_trait]
impl MembershipStore for RedisStore {
    async fn add_member(&self, client: &Client) -> Result<(), StoreError> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        push_member(&mut pipe, client);

        self.run(|mut con| async move {
            let _: () = pipe.query_async(&mut con).await?;
            Ok(())
        })
        .await
    }

    async fn remove_member(
        &self,
        room_id: &RoomId,
        client_id: &ClientId,
    ) -> Result<(), StoreError> {
        let users = users_key(room_id);
        let languages = languages_key(room_id);
        let user = user_key(client_id.as_str());
        let member = client_id.as_str().to_string();

        self.run(|mut con| async move {
            let (remaining,): (usize,) = redis::pipe()
                .atomic()
                .cmd("SREM")
                .arg(&users)
                .arg(&member)
                .ignore()
                .cmd("HDEL")
                .arg(&languages)
                .arg(&member)
                .ignore()
                .cmd("DEL")
                .arg(&user)
                .ignore()
                .cmd("SCARD")
                .arg(&users)
                .query_async(&mut con)
                .await?;

            // 空になったルームの言語情報を片付ける
            if remaining == 0 {
                let _: () = redis::cmd("DEL")
                    .arg(&languages)
                    .query_async(&mut con)
                    .await?;
            }
            Ok(())
        })
        .await
    }

    async fn room_languages(&self, room_id: &RoomId) -> Result<BTreeSet<Language>, StoreError> {
        let languages = languages_key(room_id);

        let codes: Vec<String> = self
            .run(|mut con| async move {
                redis::cmd("HVALS")
                    .arg(&languages)
                    .query_async(&mut con)
                    .await
            })
            .await?;

        Ok(codes
            .iter()
            .filter_map(|code| match code.parse::<Language>() {
                Ok(language) => Some(language),
                Err(e) => {
                    tracing::warn!("Ignoring stored language for room '{}': {}", room_id, e);
                    None
                }
            })
            .collect())
    }

    async fn replace_room(&self, room_id: &RoomId, members: &[Client]) -> Result<(), StoreError> {
        let users = users_key(room_id);
        let languages = languages_key(room_id);
        let members = members.to_vec();

        self.run(|mut con| async move {
            let previous: Vec<String> = redis::cmd("SMEMBERS")
                .arg(&users)
                .query_async(&mut con)
                .await?;

            let mut pipe = redis::pipe();
            pipe.atomic();
            pipe.cmd("DEL").arg(&users).arg(&languages).ignore();
            for id in previous
                .iter()
                .filter(|id| !members.iter().any(|c| c.id.as_str() == id.as_str()))
            {
                pipe.cmd("DEL").arg(user_key(id)).ignore();
            }
            for client in &members {
                push_member(&mut pipe, client);
            }
            let _: () = pipe.query_async(&mut con).await?;
            Ok(())
        })
        .await
    }

    async fn clear_rooms(&self) -> Result<(), StoreError> {
        let removed = self
            .run(|mut con| async move {
                let mut removed = 0usize;
                for pattern in MEMBERSHIP_PATTERNS {
                    let mut cursor: u64 = 0;
                    loop {
                        let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                            .arg(cursor)
                            .arg("MATCH")
                            .arg(pattern)
                            .arg("COUNT")
                            .arg(200)
                            .query_async(&mut con)
                            .await?;
                        if !keys.is_empty() {
                            let deleted: usize =
                                redis::cmd("DEL").arg(&keys).query_async(&mut con).await?;
                            removed += deleted;
                        }
                        if next == 0 {
                            break;
                        }
                        cursor = next;
                    }
                }
                Ok(removed)
            })
            .await?;

        tracing::info!("Cleared {} stale membership keys", removed);
        Ok(())
    }
}

#[async_trait]
impl TranslationStore for RedisStore {
    async fn get_translation(&self, key: &CacheKey) -> Result<Option<String>, StoreError> {
        let redis_key = translation_key(key);

        self.run(|mut con| async move {
            redis::cmd("GET")
                .arg(&redis_key)
                .query_async(&mut con)
                .await
        })
        .await
    }

    async fn put_translation(&self, key: &CacheKey, translated: &str) -> Result<(), StoreError> {
        let redis_key = translation_key(key);
        let value = translated.to_string();
        let ttl_secs = self.translation_ttl.as_secs().max(1);

        self.run(|mut con| async move {
            let _: () = redis::cmd("SET")
                .arg(&redis_key)
                .arg(&value)
                .arg("EX")
                .arg(ttl_secs)
                .query_async(&mut con)
                .await?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl StoreHealth for RedisStore {
    fn backend_name(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> Result<Duration, StoreError> {
        let started = Instant::now();
        let _: String = self
            .run(|mut con| async move { redis::cmd("PING").query_async(&mut con).await })
            .await?;
        Ok(started.elapsed())
    }
}
