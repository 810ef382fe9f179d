//! MessagePusher trait 定義
//!
//! クライアントへのメッセージ送信を抽象化します。
//! ソケットそのものは UI 層が所有し、ここでは送信用チャンネルだけを扱います。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ClientId, MessagePushError};

/// クライアントごとの送信チャンネル（シリアライズ済み JSON を流す）
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントの送信チャンネルを登録
    async fn register_client(&self, client_id: ClientId, sender: PusherChannel);

    /// クライアントの送信チャンネルを登録解除（チャンネルは破棄される）
    async fn unregister_client(&self, client_id: &ClientId);

    /// 複数のクライアントに送信
    ///
    /// 一部の送信失敗は許容する。宛先が 1 件以上あって誰にも届かなかった場合だけエラー。
    async fn broadcast(&self, targets: Vec<ClientId>, content: &str)
    -> Result<(), MessagePushError>;

    /// 登録中のクライアント数
    async fn count_clients(&self) -> usize;
}
