use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use super::types::{FinalResult, Standing};
use crate::event::{EventBus, RoomEvent};
use crate::room::repository::{lock_room, RoomRepository};
use crate::room::{GameMode, RoomModel, RoomStatus};
use crate::shared::{AppError, ParticipantId};
use crate::user::{unlock_achievements, GameOutcome, GameSummary, UserRepository};

/// Why a game is being finalized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Every question was played through
    Completed,
    /// A participant quit mid-game; the remaining one wins
    Forfeit { leaver: ParticipantId },
    /// Reaped by the stale-room sweep
    Abandoned,
}

impl Termination {
    fn is_forced(&self) -> bool {
        !matches!(self, Termination::Completed)
    }
}

/// Converts finished rooms into user statistics and removes them from the registry
///
/// The registry removal is the at-most-once gate: whoever removes the room
/// owns its finalization, every later attempt gets `AlreadyFinalized`.
pub struct Finalizer {
    rooms: Arc<dyn RoomRepository + Send + Sync>,
    users: Arc<dyn UserRepository>,
    event_bus: EventBus,
    lock_timeout: Duration,
    // Serializes read-modify-write of user records across rooms
    records_lock: Mutex<()>,
}

impl Finalizer {
    pub fn new(
        rooms: Arc<dyn RoomRepository + Send + Sync>,
        users: Arc<dyn UserRepository>,
        event_bus: EventBus,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            rooms,
            users,
            event_bus,
            lock_timeout,
            records_lock: Mutex::new(()),
        }
    }

    /// Finalizes a room whose last question has been played
    #[instrument(skip(self))]
    pub async fn finalize(&self, room_id: &str) -> Result<FinalResult, AppError> {
        let handle = self.rooms.room_handle(room_id).await.ok_or_else(|| {
            warn!(room_id = %room_id, "Finalize requested for a room that is gone");
            AppError::AlreadyFinalized(room_id.to_string())
        })?;
        let mut room = lock_room(&handle, room_id, self.lock_timeout).await?;

        if room.status != RoomStatus::Finished {
            return Err(AppError::InvalidState(format!(
                "room is still {}",
                room.status
            )));
        }

        self.finalize_locked(&mut room, Termination::Completed).await
    }

    /// Finalizes a room the caller already holds the lock of
    pub async fn finalize_locked(
        &self,
        room: &mut RoomModel,
        termination: Termination,
    ) -> Result<FinalResult, AppError> {
        room.status = RoomStatus::Finished;
        room.current_question = room.questions.len();
        room.question_start_time = None;

        if !self.rooms.remove_room(&room.id).await {
            return Err(AppError::AlreadyFinalized(room.id.clone()));
        }

        let mut result = build_result(room, termination);
        self.record_outcomes(room, &mut result).await?;

        info!(
            room_id = %result.room_id,
            winner_id = ?result.winner_id,
            is_tie = result.is_tie,
            forced = result.forced,
            ?termination,
            "Game finalized"
        );

        self.event_bus
            .emit(RoomEvent::GameFinished {
                room_id: result.room_id.clone(),
                result: result.clone(),
            })
            .await;

        Ok(result)
    }

    /// Drops a room without recording a game; returns false if it was already gone
    pub async fn discard(&self, room: &mut RoomModel, reason: &str) -> bool {
        room.status = RoomStatus::Finished;

        if !self.rooms.remove_room(&room.id).await {
            return false;
        }

        info!(room_id = %room.id, reason = %reason, "Room discarded");
        self.event_bus
            .emit(RoomEvent::RoomDiscarded {
                room_id: room.id.clone(),
                reason: reason.to_string(),
            })
            .await;
        true
    }

    /// Folds the game into every participant's user record and fills in unlocks
    async fn record_outcomes(
        &self,
        room: &RoomModel,
        result: &mut FinalResult,
    ) -> Result<(), AppError> {
        let _guard = self.records_lock.lock().await;

        for standing in result.standings.iter_mut() {
            let outcome = match (room.mode, result.winner_id) {
                (GameMode::Solo, _) => GameOutcome::Practice,
                (GameMode::Multiplayer, Some(winner)) if winner == standing.participant_id => {
                    GameOutcome::Won
                }
                (GameMode::Multiplayer, _) => GameOutcome::Lost,
            };

            let mut record = self
                .users
                .get_or_create(standing.participant_id, "")
                .await?;
            if record.display_name.is_empty() {
                record.display_name = standing.name.clone();
            }
            record.record_game(standing.score, outcome);

            let summary = GameSummary {
                outcome,
                correct_answers: standing.correct_answers,
                total_questions: result.total_questions,
                forced: result.forced,
            };
            standing.unlocked = unlock_achievements(&mut record, &summary);

            if !standing.unlocked.is_empty() {
                info!(
                    participant_id = standing.participant_id,
                    unlocked = ?standing.unlocked,
                    "Achievements unlocked"
                );
            }

            self.users.save(record).await?;
        }

        Ok(())
    }
}

/// Standings and winner of a room, before user records are touched
fn build_result(room: &RoomModel, termination: Termination) -> FinalResult {
    let mut standings: Vec<Standing> = room
        .players
        .iter()
        .map(|participant_id| Standing {
            participant_id: *participant_id,
            name: room.player_name(*participant_id).unwrap_or_default().to_string(),
            score: room.score_of(*participant_id),
            correct_answers: room
                .correct_answers
                .get(participant_id)
                .copied()
                .unwrap_or_default(),
            unlocked: Vec::new(),
        })
        .collect();
    standings.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.participant_id.cmp(&b.participant_id))
    });

    let top_score = standings.first().map(|s| s.score);
    let is_tie = room.mode == GameMode::Multiplayer
        && standings.len() > 1
        && standings.iter().filter(|s| Some(s.score) == top_score).count() > 1;

    let winner_id = match (room.mode, termination) {
        // Solo has no opponent to beat: completing the run is the win
        (GameMode::Solo, Termination::Completed) => standings.first().map(|s| s.participant_id),
        (GameMode::Solo, _) => None,
        (GameMode::Multiplayer, Termination::Forfeit { leaver }) => room.opponent_of(leaver),
        // Sorted by score then id, so the head is also the tie-break winner
        (GameMode::Multiplayer, _) => standings.first().map(|s| s.participant_id),
    };

    FinalResult {
        room_id: room.id.clone(),
        mode: room.mode,
        standings,
        winner_id,
        is_tie: is_tie && !matches!(termination, Termination::Forfeit { .. }),
        total_questions: room.questions.len(),
        forced: termination.is_forced(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::repository::{CreateRoomResult, InMemoryRoomRepository};
    use crate::user::{Achievement, InMemoryUserRepository};

    struct Fixture {
        finalizer: Finalizer,
        rooms: Arc<InMemoryRoomRepository>,
        users: Arc<InMemoryUserRepository>,
    }

    fn fixture() -> Fixture {
        let rooms = Arc::new(InMemoryRoomRepository::default());
        let users = Arc::new(InMemoryUserRepository::new());
        let finalizer = Finalizer::new(
            rooms.clone(),
            users.clone(),
            EventBus::new(),
            Duration::from_secs(1),
        );
        Fixture {
            finalizer,
            rooms,
            users,
        }
    }

    /// A two-player room that played through `total` questions with the given scores
    async fn finished_room(
        rooms: &InMemoryRoomRepository,
        scores: &[(ParticipantId, u32, u32)],
        total: usize,
    ) -> String {
        let (host, _, _) = scores[0];
        let mode = if scores.len() == 1 {
            GameMode::Solo
        } else {
            GameMode::Multiplayer
        };
        let mut room = RoomModel::new(format!("{host:04}"), host, format!("p{host}"), mode);
        for (participant_id, score, correct) in scores {
            room.add_player(*participant_id, format!("p{participant_id}"));
            room.scores.insert(*participant_id, *score);
            room.correct_answers.insert(*participant_id, *correct);
        }
        room.questions = vec![
            crate::question::Question {
                prompt: "?".to_string(),
                correct_answer: "a".to_string(),
                options: vec!["a".to_string(), "b".to_string()],
                media_key: None,
            };
            total
        ];
        room.current_question = total;
        room.status = RoomStatus::Finished;

        match rooms.create_room(room).await.unwrap() {
            CreateRoomResult::Created(room) => room.id,
            CreateRoomResult::CodeTaken => panic!("code collision in fixture"),
        }
    }

    #[tokio::test]
    async fn test_finalize_two_players() {
        let f = fixture();
        let room_id = finished_room(&f.rooms, &[(1, 380, 4), (2, 200, 2)], 5).await;

        let result = f.finalizer.finalize(&room_id).await.unwrap();

        assert_eq!(result.winner_id, Some(1));
        assert!(!result.is_tie);
        assert_eq!(result.standings[0].participant_id, 1);

        let winner = f.users.get(1).await.unwrap().unwrap();
        let loser = f.users.get(2).await.unwrap().unwrap();
        assert_eq!((winner.games_played, winner.wins, winner.current_streak), (1, 1, 1));
        assert_eq!((loser.games_played, loser.wins, loser.current_streak), (1, 0, 0));
        assert_eq!(loser.total_points, 200);

        assert!(f.rooms.get_room(&room_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tie_goes_to_lowest_id() {
        let f = fixture();
        let room_id = finished_room(&f.rooms, &[(9, 300, 3), (4, 300, 3)], 5).await;

        let result = f.finalizer.finalize(&room_id).await.unwrap();

        assert!(result.is_tie);
        assert_eq!(result.winner_id, Some(4));
        assert_eq!(result.standings[0].participant_id, 4);
    }

    #[tokio::test]
    async fn test_finalize_twice_fails() {
        let f = fixture();
        let room_id = finished_room(&f.rooms, &[(1, 100, 1), (2, 0, 0)], 1).await;

        f.finalizer.finalize(&room_id).await.unwrap();
        let second = f.finalizer.finalize(&room_id).await;

        assert!(matches!(second, Err(AppError::AlreadyFinalized(_))));
        assert_eq!(f.users.get(1).await.unwrap().unwrap().games_played, 1);
    }

    #[tokio::test]
    async fn test_finalize_requires_finished_room() {
        let f = fixture();
        let room = RoomModel::new("5555".to_string(), 1, "a".to_string(), GameMode::Solo);
        let room_id = room.id.clone();
        f.rooms.create_room(room).await.unwrap();

        assert!(matches!(
            f.finalizer.finalize(&room_id).await,
            Err(AppError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_solo_completion_is_practice() {
        let f = fixture();
        let room_id = finished_room(&f.rooms, &[(1, 300, 3)], 3).await;

        let result = f.finalizer.finalize(&room_id).await.unwrap();
        assert_eq!(result.winner_id, Some(1));
        assert_eq!(
            result.standings[0].unlocked,
            vec![Achievement::FirstGame, Achievement::PerfectGame]
        );

        let user = f.users.get(1).await.unwrap().unwrap();
        assert_eq!(user.games_played, 1);
        assert_eq!(user.wins, 0);
        assert_eq!(user.total_points, 300);
    }

    #[tokio::test]
    async fn test_forfeit_names_remaining_player_winner() {
        let f = fixture();
        let room_id = finished_room(&f.rooms, &[(1, 200, 2), (2, 100, 1)], 5).await;
        let handle = f.rooms.room_handle(&room_id).await.unwrap();
        let mut room = handle.lock().await;

        let result = f
            .finalizer
            .finalize_locked(&mut room, Termination::Forfeit { leaver: 1 })
            .await
            .unwrap();

        assert_eq!(result.winner_id, Some(2));
        assert!(result.forced);
        assert!(result
            .standings
            .iter()
            .all(|s| !s.unlocked.contains(&Achievement::PerfectGame)));
    }

    #[tokio::test]
    async fn test_discard_records_nothing() {
        let f = fixture();
        let mut room =
            RoomModel::new("7777".to_string(), 1, "a".to_string(), GameMode::Multiplayer);
        f.rooms.create_room(room.clone()).await.unwrap();

        assert!(f.finalizer.discard(&mut room, "host left").await);
        assert!(!f.finalizer.discard(&mut room, "host left").await);
        assert!(f.users.get(1).await.unwrap().is_none());
        assert!(f.rooms.find_by_code("7777").await.unwrap().is_none());
    }
}
