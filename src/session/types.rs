use serde::{Deserialize, Serialize};

use crate::room::{types::RoomResponse, GameMode, RoomModel};
use crate::shared::ParticipantId;
use crate::user::Achievement;

/// What participants see of the live question; never carries the answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionView {
    pub room_id: String,
    pub index: usize,
    pub total: usize,
    pub prompt: String,
    pub options: Vec<String>,
    pub media_key: Option<String>,
}

impl QuestionView {
    /// View of the room's current question, `None` once past the last one
    pub fn current(room: &RoomModel) -> Option<Self> {
        room.questions
            .get(room.current_question)
            .map(|question| Self {
                room_id: room.id.clone(),
                index: room.current_question,
                total: room.questions.len(),
                prompt: question.prompt.clone(),
                options: question.options.clone(),
                media_key: question.media_key.clone(),
            })
    }
}

/// Button payload identifying an option of a specific question
///
/// Resolved against the room's own option list, so a tap on an old
/// message cannot answer the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPayload {
    pub question_index: usize,
    pub option_index: usize,
}

/// Feedback for one accepted answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub participant_id: ParticipantId,
    pub question_index: usize,
    pub is_correct: bool,
    pub points: u32,
    pub correct_answer: String,
    pub total_score: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    /// Someone still has to answer the current question
    WaitingForOthers,
    NextQuestion { index: usize },
    /// The last question is done; exactly one caller ever receives this
    ReadyToFinalize,
}

/// Result of answering and advancing in one step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOutcome {
    pub answer: AnswerResult,
    pub advance: AdvanceOutcome,
    pub next_question: Option<QuestionView>,
    /// Present when this answer completed the game
    pub final_result: Option<FinalResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkipOutcome {
    pub skipped_index: usize,
    pub advance: AdvanceOutcome,
    pub next_question: Option<QuestionView>,
    pub final_result: Option<FinalResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "data", rename_all = "snake_case")]
pub enum LeaveOutcome {
    /// Left a waiting room that stays open
    Left(RoomResponse),
    /// The waiting room was discarded
    RoomClosed,
    /// Left mid-game; the game was finalized without the leaver
    Forfeited(FinalResult),
}

/// One participant's line in the final standings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub participant_id: ParticipantId,
    pub name: String,
    pub score: u32,
    pub correct_answers: u32,
    /// Achievements this game unlocked
    pub unlocked: Vec<Achievement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResult {
    pub room_id: String,
    pub mode: GameMode,
    /// Score desc, then participant id asc
    pub standings: Vec<Standing>,
    pub winner_id: Option<ParticipantId>,
    /// Top score was shared; the winner came from the id tie-break
    pub is_tie: bool,
    pub total_questions: usize,
    /// Ended by a leave or the stale-room sweep
    pub forced: bool,
}

impl FinalResult {
    pub fn standing_of(&self, participant_id: ParticipantId) -> Option<&Standing> {
        self.standings
            .iter()
            .find(|standing| standing.participant_id == participant_id)
    }
}

/// Request body for actions that only identify the acting participant
#[derive(Debug, Deserialize)]
pub struct ParticipantRequest {
    pub participant_id: ParticipantId,
}

/// Free-text answer
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub participant_id: ParticipantId,
    pub answer: String,
    /// Client-measured answer time; measured server-side when absent
    pub elapsed_ms: Option<u64>,
}

/// Option-button answer
#[derive(Debug, Deserialize)]
pub struct OptionAnswerRequest {
    pub participant_id: ParticipantId,
    #[serde(flatten)]
    pub payload: ActionPayload,
}
