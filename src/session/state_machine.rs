use chrono::{DateTime, Utc};
use std::time::Duration;

use super::types::{ActionPayload, AdvanceOutcome, AnswerResult};
use crate::question::Question;
use crate::room::{RoomModel, RoomStatus};
use crate::scoring::AnswerScorer;
use crate::shared::{AppError, ParticipantId};

/// Lifecycle transitions of a room: waiting -> playing -> finished
///
/// Every method here assumes the caller holds the room's lock.
impl RoomModel {
    pub fn ensure_startable(&self, participant_id: ParticipantId) -> Result<(), AppError> {
        if self.status != RoomStatus::Waiting {
            return Err(AppError::InvalidState(format!(
                "room is already {}",
                self.status
            )));
        }
        if !self.has_player(participant_id) {
            return Err(AppError::NotFound(format!(
                "Participant {participant_id} in room {}",
                self.id
            )));
        }
        if participant_id != self.host_id {
            return Err(AppError::InvalidState(
                "only the host can start the game".to_string(),
            ));
        }
        if !self.is_full() {
            return Err(AppError::InvalidState(format!(
                "waiting for players ({}/{})",
                self.player_count(),
                self.capacity()
            )));
        }
        Ok(())
    }

    /// Moves a startable room into play on its first question
    pub fn begin(&mut self, questions: Vec<Question>, now: DateTime<Utc>) {
        self.questions = questions;
        self.current_question = 0;
        self.status = RoomStatus::Playing;
        self.question_start_time = Some(now);
        self.players_answered.clear();
        for participant_id in &self.players {
            self.scores.insert(*participant_id, 0);
            self.correct_answers.insert(*participant_id, 0);
        }
        self.last_activity_at = now;
    }

    pub fn current(&self) -> Option<&Question> {
        match self.status {
            RoomStatus::Playing => self.questions.get(self.current_question),
            _ => None,
        }
    }

    /// Time since the current question was dispatched
    pub fn question_elapsed(&self, now: DateTime<Utc>) -> Duration {
        self.question_start_time
            .and_then(|started| (now - started).to_std().ok())
            .unwrap_or(Duration::ZERO)
    }

    fn ensure_playing(&self) -> Result<(), AppError> {
        if self.status != RoomStatus::Playing {
            return Err(AppError::NotPlaying {
                status: self.status,
            });
        }
        Ok(())
    }

    /// Records one participant's answer to the current question
    ///
    /// `elapsed` overrides the server-side measurement from the dispatch time.
    pub fn record_answer(
        &mut self,
        participant_id: ParticipantId,
        answer: &str,
        elapsed: Option<Duration>,
        now: DateTime<Utc>,
        scorer: &dyn AnswerScorer,
    ) -> Result<AnswerResult, AppError> {
        self.ensure_playing()?;
        if !self.has_player(participant_id) {
            return Err(AppError::NotFound(format!(
                "Participant {participant_id} in room {}",
                self.id
            )));
        }
        if self.players_answered.contains(&participant_id) {
            return Err(AppError::DuplicateAnswer {
                participant_id,
                question_index: self.current_question,
            });
        }

        let question_index = self.current_question;
        let question = self.questions.get(question_index).ok_or_else(|| {
            AppError::Corrupted(format!("no question at index {question_index}"))
        })?;

        let is_correct = question.is_correct(answer);
        let correct_answer = question.correct_answer.clone();
        let elapsed = elapsed.unwrap_or_else(|| self.question_elapsed(now));
        let points = scorer.score(is_correct, elapsed);

        self.players_answered.insert(participant_id);
        let total_score = {
            let score = self.scores.entry(participant_id).or_default();
            *score += points;
            *score
        };
        if is_correct {
            *self.correct_answers.entry(participant_id).or_default() += 1;
        }
        self.last_activity_at = now;

        Ok(AnswerResult {
            participant_id,
            question_index,
            is_correct,
            points,
            correct_answer,
            total_score,
        })
    }

    pub fn all_answered(&self) -> bool {
        self.players
            .iter()
            .all(|participant_id| self.players_answered.contains(participant_id))
    }

    /// Advances once every participant has answered the current question
    pub fn advance_if_ready(&mut self, now: DateTime<Utc>) -> Result<AdvanceOutcome, AppError> {
        self.ensure_playing()?;
        if !self.all_answered() {
            return Ok(AdvanceOutcome::WaitingForOthers);
        }
        Ok(self.move_next(now))
    }

    /// Advances past the current question regardless of who answered
    pub fn force_advance(&mut self, now: DateTime<Utc>) -> Result<AdvanceOutcome, AppError> {
        self.ensure_playing()?;
        Ok(self.move_next(now))
    }

    fn move_next(&mut self, now: DateTime<Utc>) -> AdvanceOutcome {
        self.current_question += 1;
        self.players_answered.clear();
        self.last_activity_at = now;

        if self.current_question >= self.questions.len() {
            self.current_question = self.questions.len();
            self.status = RoomStatus::Finished;
            self.question_start_time = None;
            AdvanceOutcome::ReadyToFinalize
        } else {
            self.question_start_time = Some(now);
            AdvanceOutcome::NextQuestion {
                index: self.current_question,
            }
        }
    }

    /// Turns a button payload into the option text it stands for
    pub fn resolve_option(&self, payload: &ActionPayload) -> Result<String, AppError> {
        self.ensure_playing()?;
        if payload.question_index != self.current_question {
            return Err(AppError::InvalidState(format!(
                "question {} is no longer active",
                payload.question_index + 1
            )));
        }

        self.current()
            .and_then(|question| question.option(payload.option_index))
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::BadRequest(format!("unknown option {}", payload.option_index))
            })
    }
}
