//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::Language,
    infrastructure::dto::http::{
        CacheStatsDto, CreateRoomResponse, HealthResponse, LanguageDto, MemberDto,
        RelayStatsDto, RoomDetailDto, StoreHealthDto,
    },
    ui::state::AppState,
    usecase::GetRoomDetailError,
};
use tsuyaku_shared::time::timestamp_to_rfc3339;

/// Issue a new room id
pub async fn create_room(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<CreateRoomResponse>) {
    let (room_id, created_at) = state.create_room_usecase.execute();
    (
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            room_id: room_id.into_string(),
            created_at: timestamp_to_rfc3339(created_at.value()),
        }),
    )
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let report = state.get_health_usecase.execute().await;

    // Domain Model から DTO への変換
    Json(HealthResponse {
        status: if report.is_degraded() { "degraded" } else { "ok" }.to_string(),
        timestamp: timestamp_to_rfc3339(report.timestamp.value()),
        store: StoreHealthDto {
            backend: report.store_backend.to_string(),
            reachable: !report.is_degraded(),
            latency_ms: report.store_latency.map(|d| d.as_secs_f64() * 1000.0),
        },
        cache: CacheStatsDto {
            hits: report.stats.cache_hits,
            misses: report.stats.cache_misses,
            local_entries: report.local_cache_entries,
        },
        relay: RelayStatsDto {
            active_rooms: report.active_rooms,
            active_connections: report.active_connections,
            messages_relayed: report.stats.messages_relayed,
            translation_failures: report.stats.translation_failures,
        },
    })
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    match state.get_room_detail_usecase.execute(room_id).await {
        Ok(detail) => Ok(Json(RoomDetailDto {
            room_id: detail.room_id.into_string(),
            members: detail.members.iter().map(MemberDto::from).collect(),
            languages: detail.languages,
        })),
        Err(GetRoomDetailError::RoomNotFound) => Err(StatusCode::NOT_FOUND),
        Err(GetRoomDetailError::InvalidRoomId(_)) => Err(StatusCode::BAD_REQUEST),
    }
}

/// Supported languages
pub async fn list_languages() -> Json<Vec<LanguageDto>> {
    Json(Language::ALL.iter().copied().map(LanguageDto::from).collect())
}
