use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    generators::{DisplayNameGenerator, RoomCodeGenerator},
    models::{GameMode, RoomModel},
    repository::{CreateRoomResult, JoinRoomResult, RoomRepository},
};
use crate::config::QuizConfig;
use crate::event::{EventBus, RoomEvent};
use crate::shared::{AppError, ParticipantId};
use crate::user::UserRepository;

/// Service for room creation, lookup and membership
pub struct RoomService {
    repository: Arc<dyn RoomRepository + Send + Sync>,
    users: Arc<dyn UserRepository>,
    code_generator: Arc<dyn RoomCodeGenerator>,
    name_generator: Arc<dyn DisplayNameGenerator>,
    event_bus: EventBus,
    config: Arc<QuizConfig>,
}

impl RoomService {
    pub fn new(
        repository: Arc<dyn RoomRepository + Send + Sync>,
        users: Arc<dyn UserRepository>,
        code_generator: Arc<dyn RoomCodeGenerator>,
        name_generator: Arc<dyn DisplayNameGenerator>,
        event_bus: EventBus,
        config: Arc<QuizConfig>,
    ) -> Self {
        Self {
            repository,
            users,
            code_generator,
            name_generator,
            event_bus,
            config,
        }
    }

    /// Creates a waiting room with a fresh code and the host as its first player
    ///
    /// Codes are retried on collision against active rooms only; running out
    /// of attempts is reported as a capacity failure.
    #[instrument(skip(self))]
    pub async fn create_room(
        &self,
        host_id: ParticipantId,
        host_name: Option<String>,
        mode: GameMode,
    ) -> Result<RoomModel, AppError> {
        let host_name = self.resolve_name(host_id, host_name).await?;

        for attempt in 1..=self.config.max_code_attempts {
            let code = self.code_generator.generate();
            let room = RoomModel::new(code, host_id, host_name.clone(), mode);

            match self.repository.create_room(room).await? {
                CreateRoomResult::Created(room) => {
                    info!(
                        room_id = %room.id,
                        code = %room.code,
                        mode = %mode,
                        attempt,
                        "Room created successfully"
                    );

                    self.event_bus
                        .emit(RoomEvent::RoomCreated {
                            room_id: room.id.clone(),
                            code: room.code.clone(),
                            mode,
                            host_id,
                        })
                        .await;

                    return Ok(room);
                }
                CreateRoomResult::CodeTaken => {
                    debug!(attempt, "Room code collision, retrying");
                }
            }
        }

        warn!(
            attempts = self.config.max_code_attempts,
            "Could not allocate a free room code"
        );
        Err(AppError::Capacity("no free room code available".to_string()))
    }

    /// Resolves a shared code to the ID of an active room
    #[instrument(skip(self))]
    pub async fn find_by_code(&self, code: &str) -> Result<String, AppError> {
        self.repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Room code {}", code.trim())))
    }

    /// Joins an existing room; rejections are reported as results, not errors
    #[instrument(skip(self))]
    pub async fn join_room(
        &self,
        room_id: &str,
        participant_id: ParticipantId,
        name: Option<String>,
    ) -> Result<JoinRoomResult, AppError> {
        let name = self.resolve_name(participant_id, name).await?;
        let result = self
            .repository
            .try_join_room(room_id, participant_id, &name)
            .await?;

        match &result {
            JoinRoomResult::Success(room) => {
                info!(
                    room_id = %room_id,
                    participant_id,
                    player_count = room.player_count(),
                    "Participant joined room"
                );
                self.event_bus
                    .emit(RoomEvent::PlayerJoined {
                        room_id: room.id.clone(),
                        participant_id,
                        name,
                        players: room.players.clone(),
                    })
                    .await;
            }
            JoinRoomResult::AlreadyJoined(_) => {
                debug!(room_id = %room_id, participant_id, "Participant already in room");
            }
            JoinRoomResult::RoomFull
            | JoinRoomResult::RoomNotFound
            | JoinRoomResult::NotJoinable(_) => {
                info!(room_id = %room_id, participant_id, outcome = ?result, "Join rejected");
            }
        }

        Ok(result)
    }

    /// Looks up a code and joins the room behind it
    #[instrument(skip(self))]
    pub async fn join_by_code(
        &self,
        code: &str,
        participant_id: ParticipantId,
        name: Option<String>,
    ) -> Result<JoinRoomResult, AppError> {
        match self.repository.find_by_code(code).await? {
            Some(room_id) => self.join_room(&room_id, participant_id, name).await,
            None => {
                debug!(code = %code, "No active room for code");
                Ok(JoinRoomResult::RoomNotFound)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get_room(&self, room_id: &str) -> Result<RoomModel, AppError> {
        self.repository
            .get_room(room_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Room {room_id}")))
    }

    #[instrument(skip(self))]
    pub async fn list_rooms(&self) -> Result<Vec<RoomModel>, AppError> {
        let rooms = self.repository.list_rooms().await?;
        debug!(room_count = rooms.len(), "Rooms retrieved successfully");
        Ok(rooms)
    }

    /// Picks the display name for a participant and makes sure their user record exists
    async fn resolve_name(
        &self,
        participant_id: ParticipantId,
        requested: Option<String>,
    ) -> Result<String, AppError> {
        let requested = requested
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());

        let name = match requested {
            Some(name) => name,
            None => match self.users.get(participant_id).await? {
                Some(user) => user.display_name,
                None => self.name_generator.generate(),
            },
        };

        self.users.get_or_create(participant_id, &name).await?;
        Ok(name)
    }
}
