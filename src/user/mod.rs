// Public API - what other modules can use
pub use achievements::{unlock_achievements, GameSummary};
pub use models::{Achievement, GameOutcome, UserRecord, UserStats};
pub use repository::{InMemoryUserRepository, UserRepository};

// Internal modules
mod achievements;
mod models;
mod repository;
