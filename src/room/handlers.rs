use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{info, instrument};

use super::{
    repository::JoinRoomResult,
    types::{JoinRoomRequest, RoomCreateRequest, RoomResponse},
};
use crate::shared::{AppError, AppState};

/// HTTP handler for creating a new room
///
/// POST /rooms
/// Returns room information with generated ID and shareable code
#[instrument(name = "create_room", skip(state))]
pub async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<RoomCreateRequest>,
) -> Result<Json<RoomResponse>, AppError> {
    let room = state
        .room_service
        .create_room(request.host_id, request.host_name, request.mode)
        .await?;

    info!(room_id = %room.id, code = %room.code, "Room created successfully");

    Ok(Json(RoomResponse::from(&room)))
}

/// HTTP handler for joining a room by its code
///
/// POST /rooms/join
#[instrument(name = "join_room", skip(state))]
pub async fn join_room(
    State(state): State<AppState>,
    Json(request): Json<JoinRoomRequest>,
) -> Result<Json<RoomResponse>, AppError> {
    let result = state
        .room_service
        .join_by_code(&request.code, request.participant_id, request.name)
        .await?;

    match result {
        JoinRoomResult::Success(room) | JoinRoomResult::AlreadyJoined(room) => {
            Ok(Json(RoomResponse::from(&room)))
        }
        JoinRoomResult::RoomFull => Err(AppError::Capacity("room is full".to_string())),
        JoinRoomResult::RoomNotFound => Err(AppError::NotFound(format!(
            "Room code {}",
            request.code.trim()
        ))),
        JoinRoomResult::NotJoinable(status) => Err(AppError::InvalidState(format!(
            "room is already {status}"
        ))),
    }
}

/// GET /rooms/:room_id
#[instrument(name = "get_room", skip(state))]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomResponse>, AppError> {
    let room = state.room_service.get_room(&room_id).await?;
    Ok(Json(RoomResponse::from(&room)))
}

/// HTTP handler for listing all rooms
///
/// GET /rooms
#[instrument(name = "list_rooms", skip(state))]
pub async fn list_rooms(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoomResponse>>, AppError> {
    let rooms = state.room_service.list_rooms().await?;

    info!(room_count = rooms.len(), "Rooms listed successfully");

    Ok(Json(rooms.iter().map(RoomResponse::from).collect()))
}
