use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use signquiz::{
    question::{MediaDescriptor, MediaKind},
    GameMode, Question, QuestionBank, QuestionBankError,
};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Question bank with predictable answers: question `i` is answered by `word-i`
pub struct FixedQuestionBank {
    size: usize,
    samples: AtomicUsize,
}

impl FixedQuestionBank {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            samples: AtomicUsize::new(0),
        }
    }

    pub fn answer_for(index: usize) -> String {
        format!("word-{index}")
    }

    /// How many times a session sampled questions
    pub fn sample_count(&self) -> usize {
        self.samples.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionBank for FixedQuestionBank {
    async fn sample_questions(
        &self,
        _mode: GameMode,
        count: usize,
    ) -> Result<Vec<Question>, QuestionBankError> {
        if count > self.size {
            return Err(QuestionBankError::InsufficientContent {
                needed: count,
                available: self.size,
            });
        }
        self.samples.fetch_add(1, Ordering::SeqCst);

        Ok((0..count)
            .map(|index| Question {
                prompt: format!("Which word is sign #{index}?"),
                correct_answer: Self::answer_for(index),
                options: vec![
                    "decoy-a".to_string(),
                    Self::answer_for(index),
                    "decoy-b".to_string(),
                    "decoy-c".to_string(),
                ],
                media_key: Some(Self::answer_for(index)),
            })
            .collect())
    }

    async fn lookup(&self, word: &str) -> Option<MediaDescriptor> {
        word.strip_prefix("word-").map(|_| MediaDescriptor {
            word: word.to_string(),
            path: format!("videos/{word}.mp4"),
            kind: MediaKind::Video,
        })
    }
}
