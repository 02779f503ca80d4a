// Library crate for the sign-language quiz session server
// This file exposes the public API for integration tests

pub mod config;
pub mod event;
pub mod question;
pub mod room;
pub mod routes;
pub mod scoring;
pub mod session;
pub mod shared;
pub mod user;

// Re-export commonly used types for easier access in tests
pub use config::QuizConfig;
pub use event::{EventBus, RoomEvent};
pub use question::{DictionaryQuestionBank, Question, QuestionBank, QuestionBankError};
pub use room::{
    repository::{InMemoryRoomRepository, JoinRoomResult, RoomRepository},
    GameMode, RoomModel, RoomService, RoomStatus,
};
pub use session::{AdvanceOutcome, FinalResult, SessionService};
pub use shared::{AppError, AppState, ParticipantId};
pub use user::{InMemoryUserRepository, UserRepository};
