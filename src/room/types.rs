use serde::{Deserialize, Serialize};

use super::models::{GameMode, RoomModel, RoomStatus};
use crate::shared::ParticipantId;

/// Request payload for creating a new room
#[derive(Debug, Deserialize)]
pub struct RoomCreateRequest {
    pub host_id: ParticipantId,
    pub host_name: Option<String>,
    pub mode: GameMode,
}

/// Request payload for joining a room by its shared code
#[derive(Debug, Deserialize)]
pub struct JoinRoomRequest {
    pub code: String,
    pub participant_id: ParticipantId,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSummary {
    pub participant_id: ParticipantId,
    pub name: String,
    pub score: u32,
}

/// Response for room creation and room information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomResponse {
    pub id: String,
    pub code: String,
    pub mode: GameMode,
    pub status: RoomStatus,
    pub host_id: ParticipantId,
    pub players: Vec<PlayerSummary>,
    pub capacity: usize,
    pub current_question: usize,
    pub total_questions: usize,
}

impl From<&RoomModel> for RoomResponse {
    fn from(room: &RoomModel) -> Self {
        Self {
            id: room.id.clone(),
            code: room.code.clone(),
            mode: room.mode,
            status: room.status,
            host_id: room.host_id,
            players: room
                .players
                .iter()
                .map(|id| PlayerSummary {
                    participant_id: *id,
                    name: room.player_name(*id).unwrap_or_default().to_string(),
                    score: room.score_of(*id),
                })
                .collect(),
            capacity: room.capacity(),
            current_question: room.current_question,
            total_questions: room.questions.len(),
        }
    }
}
