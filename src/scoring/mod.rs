pub mod calculator;
pub mod handlers;
pub mod ranking;

pub use calculator::{AnswerScorer, SpeedDecayScorer};
pub use ranking::{LeaderboardEntry, RankResponse, RankingService};
