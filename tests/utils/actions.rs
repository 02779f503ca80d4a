use std::time::Duration;

use signquiz::{
    session::{AnswerOutcome, AnswerResult},
    AppState, ParticipantId,
};

use super::mocks::FixedQuestionBank;

// ============================================================================
// Participant Actions
// ============================================================================

const QUICK: Duration = Duration::from_millis(900);

/// Correct answer within the scoring grace window, answer and advance together
pub async fn answer_right(
    state: &AppState,
    room_id: &str,
    participant_id: ParticipantId,
    question_index: usize,
) -> AnswerOutcome {
    state
        .session_service
        .answer(
            room_id,
            participant_id,
            &FixedQuestionBank::answer_for(question_index),
            Some(QUICK),
        )
        .await
        .unwrap()
}

pub async fn answer_wrong(
    state: &AppState,
    room_id: &str,
    participant_id: ParticipantId,
) -> AnswerOutcome {
    state
        .session_service
        .answer(room_id, participant_id, "decoy-a", Some(QUICK))
        .await
        .unwrap()
}

/// Correct answer recorded without advancing
pub async fn submit_right(
    state: &AppState,
    room_id: &str,
    participant_id: ParticipantId,
    question_index: usize,
) -> AnswerResult {
    state
        .session_service
        .submit_answer(
            room_id,
            participant_id,
            &FixedQuestionBank::answer_for(question_index),
            Some(QUICK),
        )
        .await
        .unwrap()
}

pub async fn submit_wrong(
    state: &AppState,
    room_id: &str,
    participant_id: ParticipantId,
) -> AnswerResult {
    state
        .session_service
        .submit_answer(room_id, participant_id, "decoy-b", Some(QUICK))
        .await
        .unwrap()
}
