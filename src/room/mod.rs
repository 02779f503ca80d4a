// Public API - what other modules can use
pub use handlers::{create_room, get_room, join_room, list_rooms};
pub use models::{GameMode, RoomModel, RoomStatus};
pub use service::RoomService;

// Internal modules
pub mod cleanup_task;
pub mod generators;
mod handlers;
mod models;
pub mod repository;
mod service;
pub mod types;
