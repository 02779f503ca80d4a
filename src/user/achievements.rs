use strum::IntoEnumIterator;

use super::models::{Achievement, GameOutcome, UserRecord};

/// Wins in a row for the hot streak badge
pub const HOT_STREAK_WINS: u32 = 3;
/// Lifetime points for the centurion badge
pub const CENTURION_POINTS: u64 = 1000;

/// What a participant did in the game that was just recorded
#[derive(Debug, Clone, Copy)]
pub struct GameSummary {
    pub outcome: GameOutcome,
    pub correct_answers: u32,
    pub total_questions: usize,
    /// Game ended by forfeit or sweep rather than by answering every question
    pub forced: bool,
}

impl Achievement {
    /// Whether the record, after the game was folded in, satisfies this achievement
    pub fn is_earned(&self, record: &UserRecord, game: &GameSummary) -> bool {
        match self {
            Achievement::FirstGame => record.games_played >= 1,
            Achievement::FirstWin => record.wins >= 1,
            Achievement::PerfectGame => {
                !game.forced
                    && game.total_questions > 0
                    && game.correct_answers as usize == game.total_questions
            }
            Achievement::HotStreak => record.current_streak >= HOT_STREAK_WINS,
            Achievement::Centurion => record.total_points >= CENTURION_POINTS,
        }
    }
}

/// Unlocks everything the record now qualifies for, returning only new unlocks
pub fn unlock_achievements(record: &mut UserRecord, game: &GameSummary) -> Vec<Achievement> {
    let earned: Vec<Achievement> = Achievement::iter()
        .filter(|achievement| achievement.is_earned(record, game))
        .collect();

    earned
        .into_iter()
        .filter(|achievement| record.unlock(*achievement))
        .collect()
}
