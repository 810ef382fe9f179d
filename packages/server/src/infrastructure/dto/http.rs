//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::Language;

/// `POST /rooms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub room_id: String,
    pub created_at: String,
}

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"`, or `"degraded"` while the persistent store is unreachable
    pub status: String,
    pub timestamp: String,
    pub store: StoreHealthDto,
    pub cache: CacheStatsDto,
    pub relay: RelayStatsDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreHealthDto {
    pub backend: String,
    pub reachable: bool,
    /// Round trip in milliseconds, absent when unreachable
    pub latency_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatsDto {
    pub hits: u64,
    pub misses: u64,
    pub local_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayStatsDto {
    pub active_rooms: usize,
    pub active_connections: usize,
    pub messages_relayed: u64,
    pub translation_failures: u64,
}

/// `GET /rooms/{room_id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDetailDto {
    pub room_id: String,
    pub members: Vec<MemberDto>,
    pub languages: Vec<Language>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDto {
    pub client_id: String,
    pub username: String,
    pub language: Language,
    pub joined_at: String,
}

/// `GET /languages`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageDto {
    pub code: String,
    pub name: String,
}
