// Public API - what other modules can use
pub use bank::{DictionaryQuestionBank, QuestionBank, QuestionBankError};
pub use handlers::lookup_sign;
pub use models::{DictionaryEntry, MediaDescriptor, MediaKind, Question};

// Internal modules
mod bank;
mod handlers;
mod models;
