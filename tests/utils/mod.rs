pub mod actions;
pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use actions::{answer_right, answer_wrong, submit_right, submit_wrong};
#[allow(unused_imports)]
pub use mocks::FixedQuestionBank;
#[allow(unused_imports)]
pub use setup::{TestSetup, TestSetupBuilder};
