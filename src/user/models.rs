use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strum_macros::{Display, EnumIter};

use crate::shared::ParticipantId;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Achievement {
    FirstGame,
    FirstWin,
    PerfectGame,
    HotStreak,
    Centurion,
}

/// How a finished game counts for one participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    Won,
    Lost,
    /// Solo practice: counted as played, no win/loss recorded
    Practice,
}

/// Long-lived statistics of one participant, outliving any room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub total_points: u64,
    pub games_played: u32,
    pub wins: u32,
    pub current_streak: u32,
    pub best_streak: u32,
    pub achievements: BTreeSet<Achievement>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn new(participant_id: ParticipantId, display_name: String) -> Self {
        let now = Utc::now();
        Self {
            participant_id,
            display_name,
            total_points: 0,
            games_played: 0,
            wins: 0,
            current_streak: 0,
            best_streak: 0,
            achievements: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Folds one finished game into the running totals
    pub fn record_game(&mut self, score: u32, outcome: GameOutcome) {
        self.games_played += 1;
        self.total_points += u64::from(score);

        match outcome {
            GameOutcome::Won => {
                self.wins += 1;
                self.current_streak += 1;
                self.best_streak = self.best_streak.max(self.current_streak);
            }
            GameOutcome::Lost => self.current_streak = 0,
            GameOutcome::Practice => {}
        }

        self.updated_at = Utc::now();
    }

    /// Percentage of games won, 0 when no games were played
    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        f64::from(self.wins) / f64::from(self.games_played) * 100.0
    }

    /// Returns true if the achievement was newly unlocked
    pub fn unlock(&mut self, achievement: Achievement) -> bool {
        self.achievements.insert(achievement)
    }
}

/// Public view of a user's record, as shown on the stats screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub total_points: u64,
    pub games_played: u32,
    pub wins: u32,
    pub win_rate: f64,
    pub current_streak: u32,
    pub best_streak: u32,
    pub achievements: Vec<Achievement>,
}

impl UserStats {
    /// Stats for a participant with no record yet
    pub fn empty(participant_id: ParticipantId) -> Self {
        Self::from(&UserRecord::new(participant_id, String::new()))
    }
}

impl From<&UserRecord> for UserStats {
    fn from(record: &UserRecord) -> Self {
        Self {
            participant_id: record.participant_id,
            display_name: record.display_name.clone(),
            total_points: record.total_points,
            games_played: record.games_played,
            wins: record.wins,
            win_rate: record.win_rate(),
            current_streak: record.current_streak,
            best_streak: record.best_streak,
            achievements: record.achievements.iter().copied().collect(),
        }
    }
}
