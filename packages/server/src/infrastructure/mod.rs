//! Infrastructure 層
//!
//! ドメイン層の trait の具体的な実装を提供します。
//!
//! - `repository`: Room Registry（ミラー＋永続ストア）
//! - `store`: Redis / インメモリの永続ストア
//! - `translation`: 翻訳キャッシュ・翻訳クライアント・上流プロバイダ
//! - `message_pusher`: WebSocket への送信
//! - `sequencer`: ルーム単位の順序付け
//! - `stats`: ヘルスチェック用カウンタ
//! - `dto`: ワイヤフォーマット

pub mod dto;
pub mod message_pusher;
pub mod repository;
pub mod sequencer;
pub mod stats;
pub mod store;
pub mod translation;
