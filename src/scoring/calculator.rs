use std::time::Duration;

use crate::config::QuizConfig;

/// Turns one answer into points
pub trait AnswerScorer: Send + Sync {
    /// Points for an answer given `elapsed` after the question was dispatched
    ///
    /// Must be 0 for incorrect answers and non-increasing in `elapsed`.
    fn score(&self, is_correct: bool, elapsed: Duration) -> u32;
}

/// Full points inside a grace window, then a linear per-second decay down to a floor
#[derive(Debug, Clone)]
pub struct SpeedDecayScorer {
    pub base_points: u32,
    pub grace: Duration,
    pub decay_per_second: u32,
    pub min_points: u32,
}

impl Default for SpeedDecayScorer {
    fn default() -> Self {
        Self::from_config(&QuizConfig::default())
    }
}

impl SpeedDecayScorer {
    pub fn from_config(config: &QuizConfig) -> Self {
        Self {
            base_points: config.base_points,
            grace: config.speed_grace,
            decay_per_second: config.decay_per_second,
            // A floor above the base would make slow answers worth more
            min_points: config.min_points.min(config.base_points),
        }
    }
}

impl AnswerScorer for SpeedDecayScorer {
    fn score(&self, is_correct: bool, elapsed: Duration) -> u32 {
        if !is_correct {
            return 0;
        }

        let late_seconds = elapsed.saturating_sub(self.grace).as_secs();
        let penalty = u64::from(self.decay_per_second).saturating_mul(late_seconds);

        u64::from(self.base_points)
            .saturating_sub(penalty)
            .max(u64::from(self.min_points)) as u32
    }
}
