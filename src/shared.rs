use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::config::QuizConfig;
use crate::event::EventBus;
use crate::question::QuestionBank;
use crate::room::generators::{PetNameGenerator, RandomRoomCodeGenerator};
use crate::room::repository::RoomRepository;
use crate::room::RoomService;
use crate::room::RoomStatus;
use crate::scoring::{RankingService, SpeedDecayScorer};
use crate::session::{Finalizer, SessionService};
use crate::user::UserRepository;

/// Opaque numeric participant identifier handed to us by the chat transport
pub type ParticipantId = i64;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub room_service: Arc<RoomService>,
    pub session_service: Arc<SessionService>,
    pub ranking_service: Arc<RankingService>,
    pub room_repository: Arc<dyn RoomRepository + Send + Sync>,
    pub user_repository: Arc<dyn UserRepository>,
    pub question_bank: Arc<dyn QuestionBank>,
    pub event_bus: EventBus,
    pub config: Arc<QuizConfig>,
}

impl AppState {
    /// Wires every service on top of the given repositories and question bank
    pub fn new(
        config: QuizConfig,
        room_repository: Arc<dyn RoomRepository + Send + Sync>,
        user_repository: Arc<dyn UserRepository>,
        question_bank: Arc<dyn QuestionBank>,
    ) -> Self {
        let config = Arc::new(config);
        let event_bus = EventBus::new();

        let room_service = Arc::new(RoomService::new(
            Arc::clone(&room_repository),
            Arc::clone(&user_repository),
            Arc::new(RandomRoomCodeGenerator::new(config.room_code_width)),
            Arc::new(PetNameGenerator::new()),
            event_bus.clone(),
            Arc::clone(&config),
        ));

        let finalizer = Arc::new(Finalizer::new(
            Arc::clone(&room_repository),
            Arc::clone(&user_repository),
            event_bus.clone(),
            config.lock_timeout,
        ));

        let session_service = Arc::new(SessionService::new(
            Arc::clone(&room_repository),
            Arc::clone(&question_bank),
            Arc::new(SpeedDecayScorer::from_config(&config)),
            finalizer,
            event_bus.clone(),
            Arc::clone(&config),
        ));

        let ranking_service = Arc::new(RankingService::new(Arc::clone(&user_repository)));

        Self {
            room_service,
            session_service,
            ranking_service,
            room_repository,
            user_repository,
            question_bank,
            event_bus,
            config,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Capacity exceeded: {0}")]
    Capacity(String),

    #[error("Participant {participant_id} already answered question {question_index}")]
    DuplicateAnswer {
        participant_id: ParticipantId,
        question_index: usize,
    },

    #[error("Room is not playing (status: {status})")]
    NotPlaying { status: RoomStatus },

    #[error("Room {0} was already finalized")]
    AlreadyFinalized(String),

    #[error("Timed out waiting for room {0}")]
    LockTimeout(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Room state corrupted: {0}")]
    Corrupted(String),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Stable machine-readable kind, used by transports to pick a message template
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::InvalidState(_) => "invalid_state",
            AppError::Capacity(_) => "capacity",
            AppError::DuplicateAnswer { .. } => "duplicate_answer",
            AppError::NotPlaying { .. } => "not_playing",
            AppError::AlreadyFinalized(_) => "already_finalized",
            AppError::LockTimeout(_) => "lock_timeout",
            AppError::BadRequest(_) => "bad_request",
            AppError::Corrupted(_) => "corrupted",
            AppError::Internal => "internal",
        }
    }

    /// Feedback shown to the participant whose action was rejected
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound(what) => format!("{what} could not be found."),
            AppError::InvalidState(reason) => format!("That can't be done right now: {reason}."),
            AppError::Capacity(reason) => format!("No room for that: {reason}."),
            AppError::DuplicateAnswer { .. } => {
                "You already answered this question! Waiting for the other player.".to_string()
            }
            AppError::NotPlaying {
                status: RoomStatus::Waiting,
            } => "The game hasn't started yet.".to_string(),
            AppError::NotPlaying { .. } => "Game has ended. Thanks for playing!".to_string(),
            AppError::AlreadyFinalized(_) => "This game has already been wrapped up.".to_string(),
            AppError::LockTimeout(_) => "The game is busy, please try again.".to_string(),
            AppError::BadRequest(reason) => format!("Invalid action: {reason}."),
            AppError::Corrupted(_) => {
                "Something went wrong with this game and it was closed.".to_string()
            }
            AppError::Internal => "Something went wrong, please try again later.".to_string(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidState(_)
            | AppError::Capacity(_)
            | AppError::DuplicateAnswer { .. }
            | AppError::NotPlaying { .. } => StatusCode::CONFLICT,
            AppError::AlreadyFinalized(_) => StatusCode::GONE,
            AppError::LockTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Corrupted(_) | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.user_message(),
            "kind": self.kind(),
            "detail": self.to_string(),
        }));

        (status, body).into_response()
    }
}
