//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use std::{collections::BTreeSet, time::Duration};

use async_trait::async_trait;

use super::{
    Client, ClientId, DisplayName, Language, RegistryError, RoomId, StoreError,
};

/// Room Registry trait
///
/// ルーム → 参加クライアント → 表示名・言語 の対応を一元管理する。
/// UseCase 層はこの trait に依存し、ミラーや永続ストアの存在を知らない。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// クライアントをルームに参加させる（ルームが無ければ作る）
    ///
    /// 同じ client_id がいずれかのルームに参加済みなら `AlreadyJoined`。
    async fn join(
        &self,
        room_id: RoomId,
        client_id: ClientId,
        display_name: DisplayName,
        language: Language,
    ) -> Result<Client, RegistryError>;

    /// クライアントをルームから外す
    ///
    /// 冪等。実際に外した場合だけ `Some` を返す。空になったルームは破棄される。
    async fn leave(&self, client_id: &ClientId) -> Option<Client>;

    /// ルーム内の言語（重複なし）
    async fn languages_in_room(&self, room_id: &RoomId) -> BTreeSet<Language>;

    /// ルームの参加者（参加順）
    async fn members(&self, room_id: &RoomId) -> Vec<Client>;

    /// 参加中のクライアントを取得
    async fn find_client(&self, client_id: &ClientId) -> Option<Client>;

    /// アクティブなルーム数
    async fn count_rooms(&self) -> usize;

    /// 参加中のクライアント数
    async fn count_clients(&self) -> usize;
}

/// ルーム参加情報の永続ストア
///
/// ベストエフォートで書き込まれる。正はプロセス内のミラーで、ストアはその写し。
#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn add_member(&self, client: &Client) -> Result<(), StoreError>;

    async fn remove_member(&self, room_id: &RoomId, client_id: &ClientId)
    -> Result<(), StoreError>;

    async fn room_languages(&self, room_id: &RoomId) -> Result<BTreeSet<Language>, StoreError>;

    /// ルームの参加情報を `members` で丸ごと置き換える（空ならルームを消す）
    async fn replace_room(&self, room_id: &RoomId, members: &[Client]) -> Result<(), StoreError>;

    /// すべてのルーム参加情報を消す（起動時、ミラーが空の状態に合わせる）
    async fn clear_rooms(&self) -> Result<(), StoreError>;
}

/// 永続ストアの死活確認（ヘルスチェック用、読み取り専用）
#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// バックエンド名（"redis", "memory" など）
    fn backend_name(&self) -> &'static str;

    /// 往復時間を返す
    async fn ping(&self) -> Result<Duration, StoreError>;
}
