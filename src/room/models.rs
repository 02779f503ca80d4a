use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

use crate::question::Question;
use crate::shared::ParticipantId;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameMode {
    Solo,
    Multiplayer,
}

impl GameMode {
    /// Maximum number of players a room of this mode holds
    pub fn capacity(&self) -> usize {
        match self {
            GameMode::Solo => 1,
            GameMode::Multiplayer => 2,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

/// In-memory state of one quiz session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomModel {
    pub id: String,   // Opaque UUID, primary key in the registry
    pub code: String, // Short numeric code shared with the opponent
    pub mode: GameMode,
    pub status: RoomStatus,
    pub host_id: ParticipantId,
    pub players: Vec<ParticipantId>, // Join order
    pub player_names: HashMap<ParticipantId, String>,
    pub questions: Vec<Question>,
    pub current_question: usize,
    pub question_start_time: Option<DateTime<Utc>>,
    pub players_answered: HashSet<ParticipantId>,
    pub scores: HashMap<ParticipantId, u32>,
    pub correct_answers: HashMap<ParticipantId, u32>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl RoomModel {
    /// Creates a new waiting room with a generated ID and the host as first player
    pub fn new(code: String, host_id: ParticipantId, host_name: String, mode: GameMode) -> Self {
        let now = Utc::now();
        let mut room = Self {
            id: Uuid::new_v4().to_string(),
            code,
            mode,
            status: RoomStatus::Waiting,
            host_id,
            players: Vec::with_capacity(mode.capacity()),
            player_names: HashMap::new(),
            questions: Vec::new(),
            current_question: 0,
            question_start_time: None,
            players_answered: HashSet::new(),
            scores: HashMap::new(),
            correct_answers: HashMap::new(),
            created_at: now,
            last_activity_at: now,
        };
        room.add_player(host_id, host_name);
        room
    }

    pub fn capacity(&self) -> usize {
        self.mode.capacity()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Check if room is at capacity for its mode
    pub fn is_full(&self) -> bool {
        self.players.len() >= self.capacity()
    }

    pub fn has_player(&self, participant_id: ParticipantId) -> bool {
        self.players.contains(&participant_id)
    }

    pub fn player_name(&self, participant_id: ParticipantId) -> Option<&str> {
        self.player_names.get(&participant_id).map(String::as_str)
    }

    pub fn score_of(&self, participant_id: ParticipantId) -> u32 {
        self.scores.get(&participant_id).copied().unwrap_or_default()
    }

    /// Adds a player with a zeroed score; no-op if already present
    pub fn add_player(&mut self, participant_id: ParticipantId, name: String) {
        if !self.has_player(participant_id) {
            self.players.push(participant_id);
            self.player_names.insert(participant_id, name);
            self.scores.insert(participant_id, 0);
            self.correct_answers.insert(participant_id, 0);
        }
    }

    pub fn remove_player(&mut self, participant_id: ParticipantId) {
        self.players.retain(|p| *p != participant_id);
        self.player_names.remove(&participant_id);
        self.scores.remove(&participant_id);
        self.correct_answers.remove(&participant_id);
        self.players_answered.remove(&participant_id);
    }

    /// The other participant of a two-player room
    pub fn opponent_of(&self, participant_id: ParticipantId) -> Option<ParticipantId> {
        self.players.iter().copied().find(|p| *p != participant_id)
    }

    pub fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }

    /// Verifies the structural invariants the state machine relies on
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.players.len() > self.capacity() {
            return Err(format!(
                "{} players in a {} room",
                self.players.len(),
                self.mode
            ));
        }
        if let Some(stray) = self
            .players_answered
            .iter()
            .find(|p| !self.players.contains(p))
        {
            return Err(format!("participant {stray} answered without being a player"));
        }
        if self.current_question > self.questions.len() {
            return Err(format!(
                "question index {} past {} questions",
                self.current_question,
                self.questions.len()
            ));
        }
        if self.status == RoomStatus::Playing && self.current_question >= self.questions.len() {
            return Err("playing room has no question left".to_string());
        }
        Ok(())
    }
}
