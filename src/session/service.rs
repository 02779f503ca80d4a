use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use super::{
    finalizer::{Finalizer, Termination},
    types::{
        ActionPayload, AdvanceOutcome, AnswerOutcome, AnswerResult, FinalResult, LeaveOutcome,
        QuestionView, SkipOutcome,
    },
};
use crate::config::QuizConfig;
use crate::event::{EventBus, RoomEvent};
use crate::question::{QuestionBank, QuestionBankError};
use crate::room::repository::{lock_room, RoomHandle, RoomRepository};
use crate::room::{types::RoomResponse, RoomModel, RoomStatus};
use crate::scoring::AnswerScorer;
use crate::shared::{AppError, ParticipantId};

/// Drives rooms through their game lifecycle
///
/// Each public operation takes the room's lock once and does all of its
/// reads and writes inside that single critical section.
pub struct SessionService {
    rooms: Arc<dyn RoomRepository + Send + Sync>,
    question_bank: Arc<dyn QuestionBank>,
    scorer: Arc<dyn AnswerScorer>,
    finalizer: Arc<Finalizer>,
    event_bus: EventBus,
    config: Arc<QuizConfig>,
}

impl SessionService {
    pub fn new(
        rooms: Arc<dyn RoomRepository + Send + Sync>,
        question_bank: Arc<dyn QuestionBank>,
        scorer: Arc<dyn AnswerScorer>,
        finalizer: Arc<Finalizer>,
        event_bus: EventBus,
        config: Arc<QuizConfig>,
    ) -> Self {
        Self {
            rooms,
            question_bank,
            scorer,
            finalizer,
            event_bus,
            config,
        }
    }

    async fn handle(&self, room_id: &str) -> Result<RoomHandle, AppError> {
        self.rooms
            .room_handle(room_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Room {room_id}")))
    }

    /// Discards a room whose state no longer satisfies its invariants
    async fn verify(&self, room: &mut RoomModel) -> Result<(), AppError> {
        if let Err(violation) = room.check_invariants() {
            error!(room_id = %room.id, violation = %violation, "Room invariant violated");
            self.finalizer.discard(room, "corrupted").await;
            return Err(AppError::Corrupted(violation));
        }
        Ok(())
    }

    /// Starts the game; only the host of a full waiting room may do this
    #[instrument(skip(self))]
    pub async fn start_session(
        &self,
        room_id: &str,
        participant_id: ParticipantId,
    ) -> Result<QuestionView, AppError> {
        let handle = self.handle(room_id).await?;
        let mut room = lock_room(&handle, room_id, self.config.lock_timeout).await?;

        room.ensure_startable(participant_id)?;

        let count = self.config.questions_for(room.mode);
        let questions = self
            .question_bank
            .sample_questions(room.mode, count)
            .await
            .map_err(|err| match err {
                QuestionBankError::InsufficientContent { .. } => {
                    warn!(room_id = %room_id, error = %err, "Question bank exhausted");
                    AppError::Capacity(err.to_string())
                }
                other => {
                    error!(room_id = %room_id, error = %other, "Question bank failed");
                    AppError::Internal
                }
            })?;

        room.begin(questions, Utc::now());
        self.verify(&mut room).await?;

        let view = QuestionView::current(&room).ok_or(AppError::Internal)?;
        info!(
            room_id = %room_id,
            mode = %room.mode,
            total_questions = view.total,
            "Session started"
        );

        self.event_bus
            .emit(RoomEvent::SessionStarted {
                room_id: room.id.clone(),
                total_questions: view.total,
            })
            .await;
        self.event_bus
            .emit(RoomEvent::QuestionDispatched {
                room_id: room.id.clone(),
                question: view.clone(),
            })
            .await;

        Ok(view)
    }

    /// The live question, or `None` before the start and after the last question
    #[instrument(skip(self))]
    pub async fn current_question_view(
        &self,
        room_id: &str,
    ) -> Result<Option<QuestionView>, AppError> {
        let handle = self.handle(room_id).await?;
        let room = lock_room(&handle, room_id, self.config.lock_timeout).await?;
        Ok(QuestionView::current(&room))
    }

    /// Records an answer without advancing; pair with `advance_if_ready`
    #[instrument(skip(self, answer))]
    pub async fn submit_answer(
        &self,
        room_id: &str,
        participant_id: ParticipantId,
        answer: &str,
        elapsed: Option<Duration>,
    ) -> Result<AnswerResult, AppError> {
        let handle = self.handle(room_id).await?;
        let mut room = lock_room(&handle, room_id, self.config.lock_timeout).await?;

        let result = self.record(&mut room, participant_id, answer, elapsed).await?;
        Ok(result)
    }

    /// Moves to the next question once everyone answered
    ///
    /// `ReadyToFinalize` is handed to exactly one caller, who must then call
    /// `finalize`.
    #[instrument(skip(self))]
    pub async fn advance_if_ready(&self, room_id: &str) -> Result<AdvanceOutcome, AppError> {
        let handle = self.handle(room_id).await?;
        let mut room = lock_room(&handle, room_id, self.config.lock_timeout).await?;

        let outcome = room.advance_if_ready(Utc::now())?;
        self.verify(&mut room).await?;
        self.announce_advance(&room, outcome).await;

        Ok(outcome)
    }

    /// Answers, advances and, on the last question, finalizes in one critical section
    #[instrument(skip(self, answer))]
    pub async fn answer(
        &self,
        room_id: &str,
        participant_id: ParticipantId,
        answer: &str,
        elapsed: Option<Duration>,
    ) -> Result<AnswerOutcome, AppError> {
        let handle = self.handle(room_id).await?;
        let mut room = lock_room(&handle, room_id, self.config.lock_timeout).await?;

        self.answer_locked(&mut room, participant_id, answer, elapsed)
            .await
    }

    /// Answers through an option button, resolved against the live question
    #[instrument(skip(self))]
    pub async fn answer_option(
        &self,
        room_id: &str,
        participant_id: ParticipantId,
        payload: ActionPayload,
    ) -> Result<AnswerOutcome, AppError> {
        let handle = self.handle(room_id).await?;
        let mut room = lock_room(&handle, room_id, self.config.lock_timeout).await?;

        let answer = room.resolve_option(&payload)?;
        self.answer_locked(&mut room, participant_id, &answer, None)
            .await
    }

    /// Skips the current question for everyone
    #[instrument(skip(self))]
    pub async fn skip_question(
        &self,
        room_id: &str,
        participant_id: ParticipantId,
    ) -> Result<SkipOutcome, AppError> {
        let handle = self.handle(room_id).await?;
        let mut room = lock_room(&handle, room_id, self.config.lock_timeout).await?;

        if !room.has_player(participant_id) {
            return Err(AppError::NotFound(format!(
                "Participant {participant_id} in room {room_id}"
            )));
        }

        let skipped_index = room.current_question;
        let advance = room.force_advance(Utc::now())?;
        self.verify(&mut room).await?;

        info!(room_id = %room_id, participant_id, skipped_index, "Question skipped");
        self.event_bus
            .emit(RoomEvent::QuestionSkipped {
                room_id: room.id.clone(),
                question_index: skipped_index,
                skipped_by: Some(participant_id),
            })
            .await;

        let (next_question, final_result) = self.follow_up(&mut room, advance).await?;
        Ok(SkipOutcome {
            skipped_index,
            advance,
            next_question,
            final_result,
        })
    }

    /// Removes a participant; mid-game this forfeits to whoever is left
    #[instrument(skip(self))]
    pub async fn leave(
        &self,
        room_id: &str,
        participant_id: ParticipantId,
    ) -> Result<LeaveOutcome, AppError> {
        let handle = self.handle(room_id).await?;
        let mut room = lock_room(&handle, room_id, self.config.lock_timeout).await?;

        if !room.has_player(participant_id) {
            return Err(AppError::NotFound(format!(
                "Participant {participant_id} in room {room_id}"
            )));
        }

        match room.status {
            RoomStatus::Waiting => {
                self.event_bus
                    .emit(RoomEvent::PlayerLeft {
                        room_id: room.id.clone(),
                        participant_id,
                    })
                    .await;

                if participant_id == room.host_id || room.player_count() == 1 {
                    self.finalizer.discard(&mut room, "host left").await;
                    return Ok(LeaveOutcome::RoomClosed);
                }

                room.remove_player(participant_id);
                room.touch();
                self.verify(&mut room).await?;
                info!(room_id = %room_id, participant_id, "Participant left waiting room");
                Ok(LeaveOutcome::Left(RoomResponse::from(&*room)))
            }
            RoomStatus::Playing => {
                info!(room_id = %room_id, participant_id, "Participant forfeited");
                self.event_bus
                    .emit(RoomEvent::PlayerLeft {
                        room_id: room.id.clone(),
                        participant_id,
                    })
                    .await;

                let result = self
                    .finalizer
                    .finalize_locked(
                        &mut room,
                        Termination::Forfeit {
                            leaver: participant_id,
                        },
                    )
                    .await?;
                Ok(LeaveOutcome::Forfeited(result))
            }
            RoomStatus::Finished => Err(AppError::NotPlaying {
                status: RoomStatus::Finished,
            }),
        }
    }

    pub async fn finalize(&self, room_id: &str) -> Result<FinalResult, AppError> {
        self.finalizer.finalize(room_id).await
    }

    /// Finalizes or discards a room that has seen no activity for `threshold`
    ///
    /// Activity is re-checked under the lock; a room that woke up since it
    /// was listed is left alone.
    #[instrument(skip(self))]
    pub async fn reap_room(
        &self,
        room_id: &str,
        threshold: Duration,
    ) -> Result<Option<FinalResult>, AppError> {
        let Some(handle) = self.rooms.room_handle(room_id).await else {
            return Ok(None);
        };
        let mut room = lock_room(&handle, room_id, self.config.lock_timeout).await?;

        let idle = (Utc::now() - room.last_activity_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        if idle < threshold {
            debug!(room_id = %room_id, "Room became active again, not reaping");
            return Ok(None);
        }

        match room.status {
            RoomStatus::Waiting => {
                self.finalizer.discard(&mut room, "inactive").await;
                Ok(None)
            }
            RoomStatus::Playing => {
                let result = self
                    .finalizer
                    .finalize_locked(&mut room, Termination::Abandoned)
                    .await?;
                Ok(Some(result))
            }
            RoomStatus::Finished => {
                let result = self
                    .finalizer
                    .finalize_locked(&mut room, Termination::Completed)
                    .await?;
                Ok(Some(result))
            }
        }
    }

    /// Force-advances every question that has been live for longer than `timeout`
    ///
    /// Returns how many rooms were advanced. A room that cannot be locked or
    /// advanced is logged and left for the next sweep.
    #[instrument(skip(self))]
    pub async fn expire_stalled_questions(&self, timeout: Duration) -> Result<usize, AppError> {
        let now = Utc::now();
        let stalled: Vec<(String, usize)> = self
            .rooms
            .list_rooms()
            .await?
            .into_iter()
            .filter(|room| {
                room.status == RoomStatus::Playing && room.question_elapsed(now) >= timeout
            })
            .map(|room| (room.id, room.current_question))
            .collect();

        let mut advanced = 0;
        for (room_id, question_index) in stalled {
            match self.expire_question(&room_id, question_index, timeout).await {
                Ok(true) => advanced += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(room_id = %room_id, error = %e, "Failed to expire stalled question");
                }
            }
        }

        Ok(advanced)
    }

    async fn expire_question(
        &self,
        room_id: &str,
        question_index: usize,
        timeout: Duration,
    ) -> Result<bool, AppError> {
        let Some(handle) = self.rooms.room_handle(room_id).await else {
            return Ok(false);
        };
        let mut room = lock_room(&handle, room_id, self.config.lock_timeout).await?;

        // Someone may have moved the room on between listing and locking
        let now = Utc::now();
        if room.status != RoomStatus::Playing
            || room.current_question != question_index
            || room.question_elapsed(now) < timeout
        {
            return Ok(false);
        }

        let outcome = room.force_advance(now)?;
        self.verify(&mut room).await?;
        info!(room_id = %room_id, question_index, "Question timed out");

        self.event_bus
            .emit(RoomEvent::QuestionSkipped {
                room_id: room_id.to_string(),
                question_index,
                skipped_by: None,
            })
            .await;
        self.follow_up(&mut room, outcome).await?;
        Ok(true)
    }

    async fn record(
        &self,
        room: &mut RoomModel,
        participant_id: ParticipantId,
        answer: &str,
        elapsed: Option<Duration>,
    ) -> Result<AnswerResult, AppError> {
        let result = room.record_answer(
            participant_id,
            answer,
            elapsed,
            Utc::now(),
            self.scorer.as_ref(),
        )?;
        self.verify(room).await?;

        debug!(
            room_id = %room.id,
            participant_id,
            question_index = result.question_index,
            is_correct = result.is_correct,
            points = result.points,
            "Answer recorded"
        );

        self.event_bus
            .emit(RoomEvent::AnswerRecorded {
                room_id: room.id.clone(),
                participant_id,
                question_index: result.question_index,
                is_correct: result.is_correct,
                points: result.points,
                total_score: result.total_score,
            })
            .await;

        Ok(result)
    }

    async fn answer_locked(
        &self,
        room: &mut RoomModel,
        participant_id: ParticipantId,
        answer: &str,
        elapsed: Option<Duration>,
    ) -> Result<AnswerOutcome, AppError> {
        let result = self.record(room, participant_id, answer, elapsed).await?;

        let advance = room.advance_if_ready(Utc::now())?;
        self.verify(room).await?;

        let (next_question, final_result) = self.follow_up(room, advance).await?;
        Ok(AnswerOutcome {
            answer: result,
            advance,
            next_question,
            final_result,
        })
    }

    /// Dispatches the next question or finalizes, depending on the advance
    async fn follow_up(
        &self,
        room: &mut RoomModel,
        advance: AdvanceOutcome,
    ) -> Result<(Option<QuestionView>, Option<FinalResult>), AppError> {
        match advance {
            AdvanceOutcome::WaitingForOthers => Ok((None, None)),
            AdvanceOutcome::NextQuestion { .. } => {
                self.announce_advance(room, advance).await;
                Ok((QuestionView::current(room), None))
            }
            AdvanceOutcome::ReadyToFinalize => {
                let result = self
                    .finalizer
                    .finalize_locked(room, Termination::Completed)
                    .await?;
                Ok((None, Some(result)))
            }
        }
    }

    async fn announce_advance(&self, room: &RoomModel, advance: AdvanceOutcome) {
        match advance {
            AdvanceOutcome::NextQuestion { index } => {
                debug!(room_id = %room.id, index, "Advanced to next question");
                if let Some(question) = QuestionView::current(room) {
                    self.event_bus
                        .emit(RoomEvent::QuestionDispatched {
                            room_id: room.id.clone(),
                            question,
                        })
                        .await;
                }
            }
            AdvanceOutcome::ReadyToFinalize => {
                info!(room_id = %room.id, "Last question done, ready to finalize");
            }
            AdvanceOutcome::WaitingForOthers => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::GameMode;
    use crate::shared::test_utils::AppStateBuilder;
    use crate::shared::AppState;
    use crate::user::Achievement;

    async fn multiplayer_room(state: &AppState) -> String {
        let room = state
            .room_service
            .create_room(1, Some("Ama".to_string()), GameMode::Multiplayer)
            .await
            .unwrap();
        state
            .room_service
            .join_room(&room.id, 2, Some("Kofi".to_string()))
            .await
            .unwrap();
        room.id
    }

    async fn correct_answer(state: &AppState, room_id: &str) -> String {
        let handle = state.room_repository.room_handle(room_id).await.unwrap();
        let room = handle.lock().await;
        room.current().unwrap().correct_answer.clone()
    }

    #[tokio::test]
    async fn test_start_session_rules() {
        let state = AppStateBuilder::new().build();
        let room = state
            .room_service
            .create_room(1, None, GameMode::Multiplayer)
            .await
            .unwrap();

        // Not full yet
        assert!(matches!(
            state.session_service.start_session(&room.id, 1).await,
            Err(AppError::InvalidState(_))
        ));

        state.room_service.join_room(&room.id, 2, None).await.unwrap();
        assert!(matches!(
            state.session_service.start_session(&room.id, 2).await,
            Err(AppError::InvalidState(_))
        ));

        let view = state.session_service.start_session(&room.id, 1).await.unwrap();
        assert_eq!(view.index, 0);
        assert_eq!(view.total, 5);
        assert_eq!(view.options.len(), 4);

        assert!(matches!(
            state.session_service.start_session(&room.id, 1).await,
            Err(AppError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_start_fails_when_bank_too_small() {
        let state = AppStateBuilder::new()
            .with_config(QuizConfig {
                solo_question_count: 50,
                ..QuizConfig::default()
            })
            .build();
        let room = state
            .room_service
            .create_room(1, None, GameMode::Solo)
            .await
            .unwrap();

        assert!(matches!(
            state.session_service.start_session(&room.id, 1).await,
            Err(AppError::Capacity(_))
        ));
        let room = state.room_service.get_room(&room.id).await.unwrap();
        assert_eq!(room.status, RoomStatus::Waiting);
    }

    #[tokio::test]
    async fn test_answer_before_start_is_not_playing() {
        let state = AppStateBuilder::new().build();
        let room_id = multiplayer_room(&state).await;

        let result = state.session_service.answer(&room_id, 1, "apple", None).await;
        assert!(matches!(
            result,
            Err(AppError::NotPlaying {
                status: RoomStatus::Waiting
            })
        ));
    }

    #[tokio::test]
    async fn test_answer_waits_then_advances() {
        let state = AppStateBuilder::new().build();
        let room_id = multiplayer_room(&state).await;
        state.session_service.start_session(&room_id, 1).await.unwrap();

        let answer = correct_answer(&state, &room_id).await;
        let first = state
            .session_service
            .answer(&room_id, 1, &answer, Some(Duration::from_millis(800)))
            .await
            .unwrap();
        assert!(first.answer.is_correct);
        assert_eq!(first.answer.points, 100);
        assert_eq!(first.advance, AdvanceOutcome::WaitingForOthers);

        let second = state
            .session_service
            .answer(&room_id, 2, "definitely wrong", None)
            .await
            .unwrap();
        assert_eq!(second.answer.points, 0);
        assert_eq!(second.advance, AdvanceOutcome::NextQuestion { index: 1 });
        assert_eq!(second.next_question.unwrap().index, 1);
    }

    #[tokio::test]
    async fn test_split_submit_and_advance() {
        let state = AppStateBuilder::new().build();
        let room = state
            .room_service
            .create_room(1, None, GameMode::Solo)
            .await
            .unwrap();
        state.session_service.start_session(&room.id, 1).await.unwrap();

        for _ in 0..3 {
            let answer = correct_answer(&state, &room.id).await;
            state
                .session_service
                .submit_answer(&room.id, 1, &answer, Some(Duration::ZERO))
                .await
                .unwrap();
            state.session_service.advance_if_ready(&room.id).await.unwrap();
        }

        assert!(state
            .session_service
            .current_question_view(&room.id)
            .await
            .unwrap()
            .is_none());

        let result = state.session_service.finalize(&room.id).await.unwrap();
        assert_eq!(result.standings[0].score, 300);
        assert!(matches!(
            state.session_service.finalize(&room.id).await,
            Err(AppError::AlreadyFinalized(_))
        ));
    }

    #[tokio::test]
    async fn test_answer_option_resolves_payload() {
        let state = AppStateBuilder::new().build();
        let room = state
            .room_service
            .create_room(1, None, GameMode::Solo)
            .await
            .unwrap();
        let view = state.session_service.start_session(&room.id, 1).await.unwrap();
        let answer = correct_answer(&state, &room.id).await;
        let option_index = view.options.iter().position(|o| *o == answer).unwrap();

        let stale = state
            .session_service
            .answer_option(
                &room.id,
                1,
                ActionPayload {
                    question_index: 2,
                    option_index,
                },
            )
            .await;
        assert!(matches!(stale, Err(AppError::InvalidState(_))));

        let outcome = state
            .session_service
            .answer_option(
                &room.id,
                1,
                ActionPayload {
                    question_index: 0,
                    option_index,
                },
            )
            .await
            .unwrap();
        assert!(outcome.answer.is_correct);
        assert_eq!(outcome.advance, AdvanceOutcome::NextQuestion { index: 1 });
    }

    #[tokio::test]
    async fn test_skip_to_the_end_finalizes() {
        let state = AppStateBuilder::new().build();
        let room = state
            .room_service
            .create_room(1, None, GameMode::Solo)
            .await
            .unwrap();
        state.session_service.start_session(&room.id, 1).await.unwrap();

        state.session_service.skip_question(&room.id, 1).await.unwrap();
        state.session_service.skip_question(&room.id, 1).await.unwrap();
        let last = state.session_service.skip_question(&room.id, 1).await.unwrap();

        assert_eq!(last.skipped_index, 2);
        assert_eq!(last.advance, AdvanceOutcome::ReadyToFinalize);
        let result = last.final_result.unwrap();
        assert_eq!(result.standings[0].score, 0);
        assert!(!result.standings[0].unlocked.contains(&Achievement::PerfectGame));
    }

    #[tokio::test]
    async fn test_leave_waiting_room() {
        let state = AppStateBuilder::new().build();
        let room_id = multiplayer_room(&state).await;

        match state.session_service.leave(&room_id, 2).await.unwrap() {
            LeaveOutcome::Left(room) => assert_eq!(room.players.len(), 1),
            other => panic!("Expected Left, got {other:?}"),
        }

        assert!(matches!(
            state.session_service.leave(&room_id, 1).await.unwrap(),
            LeaveOutcome::RoomClosed
        ));
        assert!(matches!(
            state.room_service.get_room(&room_id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_leave_mid_game_forfeits() {
        let state = AppStateBuilder::new().build();
        let room_id = multiplayer_room(&state).await;
        state.session_service.start_session(&room_id, 1).await.unwrap();

        let outcome = state.session_service.leave(&room_id, 1).await.unwrap();
        let LeaveOutcome::Forfeited(result) = outcome else {
            panic!("Expected forfeit");
        };
        assert_eq!(result.winner_id, Some(2));
        assert!(result.forced);

        let winner = state.user_repository.get(2).await.unwrap().unwrap();
        assert_eq!(winner.wins, 1);
        assert!(matches!(
            state.session_service.answer(&room_id, 2, "apple", None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reap_discards_idle_waiting_room() {
        let state = AppStateBuilder::new().build();
        let room_id = multiplayer_room(&state).await;

        // Still fresh
        assert!(state
            .session_service
            .reap_room(&room_id, Duration::from_secs(60))
            .await
            .unwrap()
            .is_none());
        assert!(state.room_service.get_room(&room_id).await.is_ok());

        state
            .session_service
            .reap_room(&room_id, Duration::ZERO)
            .await
            .unwrap();
        assert!(state.room_service.get_room(&room_id).await.is_err());
        assert!(state.user_repository.get(1).await.unwrap().unwrap().games_played == 0);
    }

    #[tokio::test]
    async fn test_reap_finalizes_idle_game() {
        let state = AppStateBuilder::new().build();
        let room_id = multiplayer_room(&state).await;
        state.session_service.start_session(&room_id, 1).await.unwrap();
        let answer = correct_answer(&state, &room_id).await;
        state
            .session_service
            .answer(&room_id, 2, &answer, None)
            .await
            .unwrap();

        let result = state
            .session_service
            .reap_room(&room_id, Duration::ZERO)
            .await
            .unwrap()
            .unwrap();

        assert!(result.forced);
        assert_eq!(result.winner_id, Some(2));
    }

    #[tokio::test]
    async fn test_expire_stalled_questions() {
        let state = AppStateBuilder::new().build();
        let room_id = multiplayer_room(&state).await;
        state.session_service.start_session(&room_id, 1).await.unwrap();

        let advanced = state
            .session_service
            .expire_stalled_questions(Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(advanced, 0);

        let advanced = state
            .session_service
            .expire_stalled_questions(Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(advanced, 1);

        let view = state
            .session_service
            .current_question_view(&room_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(view.index, 1);
    }

    #[tokio::test]
    async fn test_expire_stalled_questions_skips_busy_rooms() {
        let state = AppStateBuilder::new()
            .with_config(QuizConfig {
                lock_timeout: Duration::from_millis(50),
                ..QuizConfig::default()
            })
            .build();
        let stalled_id = multiplayer_room(&state).await;
        state.session_service.start_session(&stalled_id, 1).await.unwrap();
        let busy = state
            .room_service
            .create_room(3, None, GameMode::Multiplayer)
            .await
            .unwrap();

        let handle = state.room_repository.room_handle(&busy.id).await.unwrap();
        let held = handle.lock().await;

        let advanced = state
            .session_service
            .expire_stalled_questions(Duration::ZERO)
            .await
            .unwrap();
        drop(held);
        assert_eq!(advanced, 1);

        let view = state
            .session_service
            .current_question_view(&stalled_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(view.index, 1);
    }

    #[tokio::test]
    async fn test_corrupted_room_is_discarded() {
        let state = AppStateBuilder::new().build();
        let room_id = multiplayer_room(&state).await;
        state.session_service.start_session(&room_id, 1).await.unwrap();

        {
            let handle = state.room_repository.room_handle(&room_id).await.unwrap();
            handle.lock().await.players_answered.insert(42);
        }

        let result = state.session_service.answer(&room_id, 1, "apple", None).await;
        assert!(matches!(result, Err(AppError::Corrupted(_))));
        assert!(state.room_repository.room_handle(&room_id).await.is_none());
    }
}
