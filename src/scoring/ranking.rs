use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::shared::{AppError, ParticipantId};
use crate::user::{UserRecord, UserRepository, UserStats};

/// One row of the leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub total_points: u64,
    pub games_played: u32,
    pub wins: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankResponse {
    /// 1-based position; None until the user has finished a game
    pub rank: Option<usize>,
    pub stats: UserStats,
}

/// Leaderboard order: total points desc, wins desc, participant id asc
fn leaderboard_order(a: &UserRecord, b: &UserRecord) -> Ordering {
    b.total_points
        .cmp(&a.total_points)
        .then_with(|| b.wins.cmp(&a.wins))
        .then_with(|| a.participant_id.cmp(&b.participant_id))
}

/// Read-only ranking queries over user records
pub struct RankingService {
    users: Arc<dyn UserRepository>,
}

impl RankingService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Users that played at least one game, in leaderboard order
    async fn ranked(&self) -> Result<Vec<UserRecord>, AppError> {
        let mut records: Vec<UserRecord> = self
            .users
            .list()
            .await?
            .into_iter()
            .filter(|record| record.games_played > 0)
            .collect();
        records.sort_by(leaderboard_order);
        Ok(records)
    }

    #[instrument(skip(self))]
    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, AppError> {
        let entries: Vec<LeaderboardEntry> = self
            .ranked()
            .await?
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(position, record)| LeaderboardEntry {
                rank: position + 1,
                participant_id: record.participant_id,
                display_name: record.display_name,
                total_points: record.total_points,
                games_played: record.games_played,
                wins: record.wins,
            })
            .collect();

        debug!(entries = entries.len(), "Leaderboard computed");
        Ok(entries)
    }

    #[instrument(skip(self))]
    pub async fn rank_of(&self, participant_id: ParticipantId) -> Result<RankResponse, AppError> {
        let rank = self
            .ranked()
            .await?
            .iter()
            .position(|record| record.participant_id == participant_id)
            .map(|position| position + 1);

        let stats = match self.users.get(participant_id).await? {
            Some(record) => UserStats::from(&record),
            None => UserStats::empty(participant_id),
        };

        Ok(RankResponse { rank, stats })
    }
}
