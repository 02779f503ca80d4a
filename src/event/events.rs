use serde::{Deserialize, Serialize};

use crate::room::GameMode;
use crate::session::{FinalResult, QuestionView};
use crate::shared::ParticipantId;

/// Things that happened in a room
///
/// Events are facts emitted after the room's lock-protected state change has
/// been committed, so subscribers never observe a half-applied transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoomEvent {
    RoomCreated {
        room_id: String,
        code: String,
        mode: GameMode,
        host_id: ParticipantId,
    },

    PlayerJoined {
        room_id: String,
        participant_id: ParticipantId,
        name: String,
        players: Vec<ParticipantId>,
    },

    PlayerLeft {
        room_id: String,
        participant_id: ParticipantId,
    },

    SessionStarted {
        room_id: String,
        total_questions: usize,
    },

    /// A new question is live; carries no answer
    QuestionDispatched {
        room_id: String,
        question: QuestionView,
    },

    AnswerRecorded {
        room_id: String,
        participant_id: ParticipantId,
        question_index: usize,
        is_correct: bool,
        points: u32,
        total_score: u32,
    },

    QuestionSkipped {
        room_id: String,
        question_index: usize,
        skipped_by: Option<ParticipantId>, // None when skipped by the question timeout
    },

    GameFinished {
        room_id: String,
        result: FinalResult,
    },

    /// Room dropped without a game being recorded
    RoomDiscarded { room_id: String, reason: String },
}

impl RoomEvent {
    pub fn room_id(&self) -> &str {
        match self {
            RoomEvent::RoomCreated { room_id, .. } => room_id,
            RoomEvent::PlayerJoined { room_id, .. } => room_id,
            RoomEvent::PlayerLeft { room_id, .. } => room_id,
            RoomEvent::SessionStarted { room_id, .. } => room_id,
            RoomEvent::QuestionDispatched { room_id, .. } => room_id,
            RoomEvent::AnswerRecorded { room_id, .. } => room_id,
            RoomEvent::QuestionSkipped { room_id, .. } => room_id,
            RoomEvent::GameFinished { room_id, .. } => room_id,
            RoomEvent::RoomDiscarded { room_id, .. } => room_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            RoomEvent::RoomCreated { .. } => "room_created",
            RoomEvent::PlayerJoined { .. } => "player_joined",
            RoomEvent::PlayerLeft { .. } => "player_left",
            RoomEvent::SessionStarted { .. } => "session_started",
            RoomEvent::QuestionDispatched { .. } => "question_dispatched",
            RoomEvent::AnswerRecorded { .. } => "answer_recorded",
            RoomEvent::QuestionSkipped { .. } => "question_skipped",
            RoomEvent::GameFinished { .. } => "game_finished",
            RoomEvent::RoomDiscarded { .. } => "room_discarded",
        }
    }

    /// Terminal events after which the room's channel can be dropped
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RoomEvent::GameFinished { .. } | RoomEvent::RoomDiscarded { .. }
        )
    }
}
