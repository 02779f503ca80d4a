use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument};

use super::ranking::{LeaderboardEntry, RankResponse};
use crate::shared::{AppError, AppState, ParticipantId};

const DEFAULT_LEADERBOARD_SIZE: usize = 10;
const MAX_LEADERBOARD_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<usize>,
}

/// HTTP handler for the global leaderboard
///
/// GET /leaderboard?limit=N
#[instrument(name = "leaderboard", skip(state))]
pub async fn leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LEADERBOARD_SIZE)
        .min(MAX_LEADERBOARD_SIZE);

    let entries = state.ranking_service.leaderboard(limit).await?;
    info!(entries = entries.len(), "Leaderboard served");

    Ok(Json(entries))
}

/// HTTP handler for one user's rank and statistics
///
/// GET /users/:participant_id/rank
#[instrument(name = "user_rank", skip(state))]
pub async fn user_rank(
    State(state): State<AppState>,
    Path(participant_id): Path<ParticipantId>,
) -> Result<Json<RankResponse>, AppError> {
    let rank = state.ranking_service.rank_of(participant_id).await?;
    Ok(Json(rank))
}
