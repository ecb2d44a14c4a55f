//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::ChatRoomKey,
    infrastructure::dto::http::{MessageDto, SessionDto},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// List live sessions (rooms with at least one connection)
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<SessionDto>> {
    let sessions = state.registry.snapshot_all().await;
    Json(sessions.into_iter().map(SessionDto::from).collect())
}

/// Get the live session of one room
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(room_key): Path<String>,
) -> Result<Json<SessionDto>, StatusCode> {
    let room_key = ChatRoomKey::new(room_key).map_err(|_| StatusCode::BAD_REQUEST)?;
    state
        .registry
        .snapshot(&room_key)
        .await
        .map(|snapshot| Json(SessionDto::from(snapshot)))
        .ok_or(StatusCode::NOT_FOUND)
}

/// Get the stored history of one room
pub async fn get_room_messages(
    State(state): State<Arc<AppState>>,
    Path(room_key): Path<String>,
) -> Result<Json<Vec<MessageDto>>, StatusCode> {
    let room_key = ChatRoomKey::new(room_key).map_err(|_| StatusCode::BAD_REQUEST)?;
    let messages = state.history.list_by_room(&room_key).await;
    Ok(Json(messages.into_iter().map(MessageDto::from).collect()))
}
