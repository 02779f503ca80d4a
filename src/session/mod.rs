// Public API - what other modules can use
pub use finalizer::{Finalizer, Termination};
pub use service::SessionService;
pub use types::{
    ActionPayload, AdvanceOutcome, AnswerOutcome, AnswerResult, FinalResult, LeaveOutcome,
    QuestionView, SkipOutcome, Standing,
};

// Internal modules
mod finalizer;
pub mod handlers;
mod service;
mod state_machine;
pub mod types;
