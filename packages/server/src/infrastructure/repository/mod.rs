//! Repository の実装
//!
//! - `registry`: ミラー＋永続ストアによる Room Registry

pub mod registry;

pub use registry::RoomRegistry;
