use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, instrument, warn};

use super::repository::RoomRepository;
use crate::config::QuizConfig;
use crate::session::SessionService;
use crate::shared::AppError;

/// Configuration for the cleanup task
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// How often to run the cleanup task
    pub cleanup_interval: Duration,
    /// How long a room must be inactive before it is reaped
    pub inactivity_threshold: Duration,
    /// Questions live for longer than this are skipped; `None` disables it
    pub question_timeout: Option<Duration>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self::from(&QuizConfig::default())
    }
}

impl From<&QuizConfig> for CleanupConfig {
    fn from(config: &QuizConfig) -> Self {
        Self {
            cleanup_interval: config.cleanup_interval,
            inactivity_threshold: config.inactivity_threshold,
            question_timeout: config.question_timeout,
        }
    }
}

/// Starts the background sweep that reaps inactive rooms and stalled questions
#[instrument(skip(room_repository, session_service))]
pub async fn start_cleanup_task(
    room_repository: Arc<dyn RoomRepository + Send + Sync>,
    session_service: Arc<SessionService>,
    config: CleanupConfig,
) {
    info!(
        cleanup_interval_secs = config.cleanup_interval.as_secs(),
        inactivity_threshold_secs = config.inactivity_threshold.as_secs(),
        question_timeout_secs = ?config.question_timeout.map(|t| t.as_secs()),
        "Starting room cleanup background task"
    );

    let mut cleanup_interval = interval(config.cleanup_interval);

    loop {
        cleanup_interval.tick().await;

        if let Some(timeout) = config.question_timeout {
            match session_service.expire_stalled_questions(timeout).await {
                Ok(0) => {}
                Ok(advanced) => info!(advanced, "Skipped stalled questions"),
                Err(e) => error!(error = %e, "Stalled question sweep failed"),
            }
        }

        match cleanup_inactive_rooms(
            &room_repository,
            &session_service,
            config.inactivity_threshold,
        )
        .await
        {
            Ok(reaped_count) => {
                info!(reaped_count, "Room cleanup completed");
            }
            Err(e) => {
                error!(error = %e, "Room cleanup task failed");
            }
        }
    }
}

/// Finalizes or discards rooms that have been inactive for longer than the threshold
#[instrument(skip(room_repository, session_service))]
async fn cleanup_inactive_rooms(
    room_repository: &Arc<dyn RoomRepository + Send + Sync>,
    session_service: &Arc<SessionService>,
    inactivity_threshold: Duration,
) -> Result<usize, AppError> {
    let inactive_room_ids = room_repository
        .get_inactive_rooms(inactivity_threshold)
        .await?;

    if inactive_room_ids.is_empty() {
        return Ok(0);
    }

    info!(count = inactive_room_ids.len(), "Found inactive rooms to reap");

    let mut reaped_count = 0;

    for room_id in inactive_room_ids {
        match session_service
            .reap_room(&room_id, inactivity_threshold)
            .await
        {
            Ok(result) => {
                if room_repository.room_handle(&room_id).await.is_none() {
                    reaped_count += 1;
                    info!(
                        room_id = %room_id,
                        finalized = result.is_some(),
                        "Reaped inactive room"
                    );
                }
            }
            Err(e) => {
                warn!(
                    room_id = %room_id,
                    error = %e,
                    "Failed to reap inactive room"
                );
            }
        }
    }

    Ok(reaped_count)
}
