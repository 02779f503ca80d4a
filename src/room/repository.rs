use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info, instrument, warn};

use super::models::{RoomModel, RoomStatus};
use crate::shared::{AppError, ParticipantId};

/// Exclusive handle to one room; every read-modify-write of a room goes through its lock
pub type RoomHandle = Arc<Mutex<RoomModel>>;

/// Result of attempting to register a new room
#[derive(Debug, Clone)]
pub enum CreateRoomResult {
    /// Room stored, returns the stored data
    Created(RoomModel),
    /// Another active room holds the same code
    CodeTaken,
}

/// Result of attempting to join a room
#[derive(Debug, Clone)]
pub enum JoinRoomResult {
    /// Successfully joined the room, returns updated room data
    Success(RoomModel),
    /// Participant was already in the room
    AlreadyJoined(RoomModel),
    /// Room is at capacity for its mode
    RoomFull,
    /// Room does not exist
    RoomNotFound,
    /// Room is no longer accepting players
    NotJoinable(RoomStatus),
}

/// Acquires a room's lock, giving up after `timeout`
pub async fn lock_room<'a>(
    handle: &'a RoomHandle,
    room_id: &str,
    timeout: Duration,
) -> Result<MutexGuard<'a, RoomModel>, AppError> {
    tokio::time::timeout(timeout, handle.lock())
        .await
        .map_err(|_| {
            warn!(
                room_id = %room_id,
                timeout_ms = timeout.as_millis() as u64,
                "Room lock timed out"
            );
            AppError::LockTimeout(room_id.to_string())
        })
}

/// Trait for room registry operations
#[async_trait]
pub trait RoomRepository {
    /// Atomically registers a room unless its code is held by another active room
    async fn create_room(&self, room: RoomModel) -> Result<CreateRoomResult, AppError>;
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, AppError>;
    async fn room_handle(&self, room_id: &str) -> Option<RoomHandle>;
    async fn list_rooms(&self) -> Result<Vec<RoomModel>, AppError>;

    /// Resolves a room code, ignoring finished rooms
    async fn find_by_code(&self, code: &str) -> Result<Option<String>, AppError>;

    /// Atomically checks status and capacity before adding the participant
    async fn try_join_room(
        &self,
        room_id: &str,
        participant_id: ParticipantId,
        name: &str,
    ) -> Result<JoinRoomResult, AppError>;

    /// Removes the room and frees its code; returns false if it was already gone
    async fn remove_room(&self, room_id: &str) -> bool;

    async fn update_last_activity(&self, room_id: &str) -> Result<(), AppError>;

    /// Room IDs without activity for longer than `threshold`
    async fn get_inactive_rooms(&self, threshold: Duration) -> Result<Vec<String>, AppError>;
}

struct RoomEntry {
    code: String,
    handle: RoomHandle,
}

#[derive(Default)]
struct RoomTable {
    rooms: HashMap<String, RoomEntry>,
    codes: HashMap<String, String>, // code -> room_id, active rooms only
}

/// In-memory implementation of RoomRepository
///
/// The table lock only guards map membership. Room state lives behind the
/// per-room mutex so operations on different rooms never contend.
pub struct InMemoryRoomRepository {
    table: RwLock<RoomTable>,
    lock_timeout: Duration,
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl InMemoryRoomRepository {
    /// Creates a new empty in-memory repository
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            table: RwLock::new(RoomTable::default()),
            lock_timeout,
        }
    }

    async fn handles(&self) -> Vec<(String, RoomHandle)> {
        let table = self.table.read().await;
        table
            .rooms
            .iter()
            .map(|(id, entry)| (id.clone(), Arc::clone(&entry.handle)))
            .collect()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    #[instrument(skip(self, room), fields(room_id = %room.id, code = %room.code))]
    async fn create_room(&self, room: RoomModel) -> Result<CreateRoomResult, AppError> {
        let mut table = self.table.write().await;

        if table.codes.contains_key(&room.code) {
            debug!("Room code already in use");
            return Ok(CreateRoomResult::CodeTaken);
        }
        if table.rooms.contains_key(&room.id) {
            warn!("Room already exists in memory");
            return Err(AppError::InvalidState("Room already exists".to_string()));
        }

        table.codes.insert(room.code.clone(), room.id.clone());
        table.rooms.insert(
            room.id.clone(),
            RoomEntry {
                code: room.code.clone(),
                handle: Arc::new(Mutex::new(room.clone())),
            },
        );

        debug!("Room created successfully in memory");
        Ok(CreateRoomResult::Created(room))
    }

    #[instrument(skip(self))]
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, AppError> {
        let Some(handle) = self.room_handle(room_id).await else {
            debug!(room_id = %room_id, "Room not found in memory");
            return Ok(None);
        };

        let room = lock_room(&handle, room_id, self.lock_timeout).await?;
        Ok(Some(room.clone()))
    }

    async fn room_handle(&self, room_id: &str) -> Option<RoomHandle> {
        let table = self.table.read().await;
        table
            .rooms
            .get(room_id)
            .map(|entry| Arc::clone(&entry.handle))
    }

    #[instrument(skip(self))]
    async fn list_rooms(&self) -> Result<Vec<RoomModel>, AppError> {
        let mut room_list = Vec::new();
        for (room_id, handle) in self.handles().await {
            // A room held past the lock timeout is left out of this snapshot
            match lock_room(&handle, &room_id, self.lock_timeout).await {
                Ok(room) => room_list.push(room.clone()),
                Err(_) => debug!(room_id = %room_id, "Skipping busy room"),
            }
        }

        debug!(room_count = room_list.len(), "Rooms listed successfully in memory");
        Ok(room_list)
    }

    #[instrument(skip(self))]
    async fn find_by_code(&self, code: &str) -> Result<Option<String>, AppError> {
        let room_id = {
            let table = self.table.read().await;
            table.codes.get(code.trim()).cloned()
        };
        let Some(room_id) = room_id else {
            debug!("No active room with this code");
            return Ok(None);
        };
        let Some(handle) = self.room_handle(&room_id).await else {
            return Ok(None);
        };

        let room = lock_room(&handle, &room_id, self.lock_timeout).await?;
        if room.status == RoomStatus::Finished {
            debug!(room_id = %room_id, "Code belongs to a finished room");
            return Ok(None);
        }

        Ok(Some(room_id))
    }

    #[instrument(skip(self))]
    async fn try_join_room(
        &self,
        room_id: &str,
        participant_id: ParticipantId,
        name: &str,
    ) -> Result<JoinRoomResult, AppError> {
        let Some(handle) = self.room_handle(room_id).await else {
            debug!("Room not found");
            return Ok(JoinRoomResult::RoomNotFound);
        };

        let mut room = lock_room(&handle, room_id, self.lock_timeout).await?;

        if room.has_player(participant_id) {
            debug!("Participant already in room");
            return Ok(JoinRoomResult::AlreadyJoined(room.clone()));
        }
        if room.status != RoomStatus::Waiting {
            debug!(status = %room.status, "Room is not accepting players");
            return Ok(JoinRoomResult::NotJoinable(room.status));
        }
        if room.is_full() {
            debug!(current_count = room.player_count(), "Room is full");
            return Ok(JoinRoomResult::RoomFull);
        }

        room.add_player(participant_id, name.to_string());
        room.touch();

        info!(
            new_player_count = room.player_count(),
            "Participant joined room successfully (atomic)"
        );

        Ok(JoinRoomResult::Success(room.clone()))
    }

    #[instrument(skip(self))]
    async fn remove_room(&self, room_id: &str) -> bool {
        let mut table = self.table.write().await;
        match table.rooms.remove(room_id) {
            Some(entry) => {
                // Only free the code if it still points at this room
                if table.codes.get(&entry.code).map(String::as_str) == Some(room_id) {
                    table.codes.remove(&entry.code);
                }
                info!(code = %entry.code, "Room removed from registry");
                true
            }
            None => {
                debug!("Room already removed");
                false
            }
        }
    }

    #[instrument(skip(self))]
    async fn update_last_activity(&self, room_id: &str) -> Result<(), AppError> {
        let handle = self
            .room_handle(room_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Room {room_id}")))?;

        lock_room(&handle, room_id, self.lock_timeout).await?.touch();
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_inactive_rooms(&self, threshold: Duration) -> Result<Vec<String>, AppError> {
        let threshold = chrono::Duration::from_std(threshold)
            .map_err(|_| AppError::BadRequest("Inactivity threshold out of range".to_string()))?;
        let cutoff = Utc::now() - threshold;

        let mut inactive = Vec::new();
        for (room_id, handle) in self.handles().await {
            // A busy room is by definition active
            let Ok(room) = handle.try_lock() else {
                continue;
            };
            if room.last_activity_at < cutoff {
                inactive.push(room_id);
            }
        }

        Ok(inactive)
    }
}
