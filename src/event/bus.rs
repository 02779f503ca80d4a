use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use super::events::RoomEvent;

const ROOM_CHANNEL_CAPACITY: usize = 100;

/// Event bus for distributing room events to transport subscribers
#[derive(Debug, Clone)]
pub struct EventBus {
    /// Room-specific event channels: room_id -> sender
    room_channels: Arc<RwLock<HashMap<String, broadcast::Sender<RoomEvent>>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            room_channels: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Emits an event to all subscribers of its room
    ///
    /// Terminal events close the room's channel once delivered.
    pub async fn emit(&self, event: RoomEvent) {
        let room_id = event.room_id().to_string();
        let terminal = event.is_terminal();

        {
            let room_channels = self.room_channels.read().await;
            match room_channels.get(&room_id) {
                Some(sender) => match sender.send(event) {
                    Ok(receiver_count) => {
                        debug!(
                            room_id = %room_id,
                            receivers = receiver_count,
                            "Room event emitted"
                        );
                    }
                    Err(_) => {
                        debug!(room_id = %room_id, "Room event emitted with no receivers");
                    }
                },
                None => {
                    debug!(
                        room_id = %room_id,
                        event = event.event_type(),
                        "No subscribers for room"
                    );
                }
            }
        }

        if terminal {
            self.close_room(&room_id).await;
        }
    }

    /// Subscribe to events for a specific room
    pub async fn subscribe_to_room(&self, room_id: &str) -> broadcast::Receiver<RoomEvent> {
        {
            let room_channels = self.room_channels.read().await;
            if let Some(sender) = room_channels.get(room_id) {
                return sender.subscribe();
            }
        }

        debug!(room_id = %room_id, "Creating new room channel for subscription");
        let mut room_channels = self.room_channels.write().await;
        room_channels
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(ROOM_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Drops the room's channel; receivers see the stream end
    pub async fn close_room(&self, room_id: &str) {
        let mut room_channels = self.room_channels.write().await;
        if room_channels.remove(room_id).is_some() {
            debug!(room_id = %room_id, "Room channel closed");
        }
    }

    pub async fn channel_count(&self) -> usize {
        self.room_channels.read().await.len()
    }
}
