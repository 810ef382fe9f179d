//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの送信チャンネル（`PusherChannel`）を client_id で管理
//! - 宛先クライアントへのメッセージ送信（broadcast）
//!
//! ## 設計ノート
//!
//! ソケットの生成と書き込みは UI 層（`ui/handler/websocket.rs` の pusher_loop）が行います。
//! ここではチャンネルに JSON 文字列を流すだけなので、あるクライアントへの書き込みが
//! 遅くても他のクライアントへの配信は待たされません。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ClientId, MessagePushError, MessagePusher, PusherChannel};

/// WebSocket を使った MessagePusher 実装
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの送信チャンネル
    clients: Mutex<HashMap<ClientId, PusherChannel>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, client_id: ClientId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        tracing::debug!("Client '{}' registered to MessagePusher", client_id);
        clients.insert(client_id, sender);
    }

    async fn unregister_client(&self, client_id: &ClientId) {
        let mut clients = self.clients.lock().await;
        if clients.remove(client_id).is_some() {
            tracing::debug!("Client '{}' unregistered from MessagePusher", client_id);
        }
    }

    async fn broadcast(
        &self,
        targets: Vec<ClientId>,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;
        let total = targets.len();
        let mut delivered = 0;

        for target in targets {
            match clients.get(&target) {
                Some(sender) => {
                    // ブロードキャストでは一部の送信失敗を許容
                    match sender.send(content.to_string()) {
                        Ok(()) => delivered += 1,
                        Err(e) => {
                            tracing::warn!("Failed to push message to client '{}': {}", target, e)
                        }
                    }
                }
                None => {
                    tracing::debug!("Client '{}' not registered during broadcast, skipping", target);
                }
            }
        }

        if total > 0 && delivered == 0 {
            return Err(MessagePushError::NoRecipientReached(total));
        }
        Ok(())
    }

    async fn count_clients(&self) -> usize {
        self.clients.lock().await.len()
    }
}
