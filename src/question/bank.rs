use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, instrument};

use super::models::{DictionaryEntry, MediaDescriptor, MediaKind, Question};
use crate::room::GameMode;

#[derive(Debug, Error)]
pub enum QuestionBankError {
    #[error("Not enough words for {needed} questions ({available} available)")]
    InsufficientContent { needed: usize, available: usize },

    #[error("Failed to read dictionary: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse dictionary: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Supplier of quiz items, backed by the sign dictionary
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Draws `count` questions with distinct correct answers
    async fn sample_questions(
        &self,
        mode: GameMode,
        count: usize,
    ) -> Result<Vec<Question>, QuestionBankError>;

    /// Looks up the sign media for a word
    async fn lookup(&self, word: &str) -> Option<MediaDescriptor>;
}

/// Question bank drawing prompts and distractors from dictionary entries
pub struct DictionaryQuestionBank {
    entries: Vec<DictionaryEntry>,
    options_per_question: usize,
}

impl DictionaryQuestionBank {
    /// Creates a bank over the given entries; duplicate words are dropped
    pub fn new(entries: Vec<DictionaryEntry>, options_per_question: usize) -> Self {
        let mut seen = HashSet::new();
        let entries: Vec<DictionaryEntry> = entries
            .into_iter()
            .filter(|entry| !entry.word.trim().is_empty())
            .filter(|entry| seen.insert(entry.word.trim().to_lowercase()))
            .collect();

        Self {
            entries,
            options_per_question: options_per_question.max(2),
        }
    }

    /// Loads the dictionary from a JSON array of entries
    #[instrument]
    pub fn from_json_file(
        path: &Path,
        options_per_question: usize,
    ) -> Result<Self, QuestionBankError> {
        let raw = std::fs::read_to_string(path)?;
        let entries: Vec<DictionaryEntry> = serde_json::from_str(&raw)?;
        let bank = Self::new(entries, options_per_question);

        info!(
            path = %path.display(),
            word_count = bank.len(),
            "Loaded dictionary for question bank"
        );

        Ok(bank)
    }

    /// Small built-in word list used when no dictionary file is configured
    pub fn builtin(options_per_question: usize) -> Self {
        let words = [
            "hello", "thank you", "please", "sorry", "family", "mother", "father", "friend",
            "school", "water", "food", "house",
        ];
        let entries = words
            .iter()
            .map(|word| DictionaryEntry {
                word: word.to_string(),
                category: "words".to_string(),
                path: format!("data/videos/words/{}.mp4", word.replace(' ', "_")),
                kind: MediaKind::Video,
            })
            .collect();

        Self::new(entries, options_per_question)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn build_questions(&self, mode: GameMode, count: usize) -> Vec<Question> {
        let mut rng = rand::rng();
        let picked = rand::seq::index::sample(&mut rng, self.entries.len(), count);

        picked
            .iter()
            .map(|index| self.build_question(mode, index, &mut rng))
            .collect()
    }

    fn build_question<R: Rng + ?Sized>(
        &self,
        mode: GameMode,
        index: usize,
        rng: &mut R,
    ) -> Question {
        let entry = &self.entries[index];
        let distractor_count = (self.options_per_question - 1).min(self.entries.len() - 1);

        let mut options: Vec<String> =
            rand::seq::index::sample(rng, self.entries.len() - 1, distractor_count)
                .iter()
                // Skip over the correct entry so distractors never repeat it
                .map(|i| if i >= index { i + 1 } else { i })
                .map(|i| self.entries[i].word.clone())
                .collect();
        options.push(entry.word.clone());
        options.shuffle(rng);

        let prompt = match mode {
            GameMode::Solo => "What does this sign mean?",
            GameMode::Multiplayer => "Which word matches this sign?",
        };

        Question {
            prompt: prompt.to_string(),
            correct_answer: entry.word.clone(),
            options,
            media_key: Some(entry.word.clone()),
        }
    }
}

#[async_trait]
impl QuestionBank for DictionaryQuestionBank {
    #[instrument(skip(self))]
    async fn sample_questions(
        &self,
        mode: GameMode,
        count: usize,
    ) -> Result<Vec<Question>, QuestionBankError> {
        // A question needs at least one distractor besides its answer
        if count == 0 || self.entries.len() < count.max(2) {
            return Err(QuestionBankError::InsufficientContent {
                needed: count.max(2),
                available: self.entries.len(),
            });
        }

        let questions = self.build_questions(mode, count);
        debug!(count = questions.len(), "Sampled questions");
        Ok(questions)
    }

    async fn lookup(&self, word: &str) -> Option<MediaDescriptor> {
        let needle = word.trim().to_lowercase();
        self.entries
            .iter()
            .find(|entry| entry.word.to_lowercase() == needle)
            .map(MediaDescriptor::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_utils::sample_dictionary;
    use rstest::rstest;

    #[rstest]
    #[case(GameMode::Solo, 3)]
    #[case(GameMode::Multiplayer, 5)]
    #[tokio::test]
    async fn test_sample_questions_have_distinct_answers(
        #[case] mode: GameMode,
        #[case] count: usize,
    ) {
        let bank = DictionaryQuestionBank::new(sample_dictionary(), 4);

        let questions = bank.sample_questions(mode, count).await.unwrap();
        assert_eq!(questions.len(), count);

        let answers: HashSet<_> = questions.iter().map(|q| q.correct_answer.clone()).collect();
        assert_eq!(answers.len(), count);

        for question in &questions {
            assert_eq!(question.options.len(), 4);
            assert!(question.options.contains(&question.correct_answer));
            let distinct: HashSet<_> = question.options.iter().collect();
            assert_eq!(distinct.len(), question.options.len());
            assert_eq!(question.media_key.as_deref(), Some(question.correct_answer.as_str()));
        }
    }

    #[tokio::test]
    async fn test_sample_fails_when_dictionary_too_small() {
        let entries = sample_dictionary().into_iter().take(2).collect();
        let bank = DictionaryQuestionBank::new(entries, 4);

        let result = bank.sample_questions(GameMode::Solo, 3).await;
        assert!(matches!(
            result,
            Err(QuestionBankError::InsufficientContent {
                needed: 3,
                available: 2
            })
        ));
    }

    #[tokio::test]
    async fn test_options_shrink_to_dictionary_size() {
        let entries = sample_dictionary().into_iter().take(3).collect();
        let bank = DictionaryQuestionBank::new(entries, 4);

        let questions = bank.sample_questions(GameMode::Solo, 3).await.unwrap();
        for question in questions {
            assert_eq!(question.options.len(), 3);
        }
    }

    #[test]
    fn test_duplicate_words_are_dropped() {
        let mut entries = sample_dictionary();
        entries.push(DictionaryEntry {
            word: "APPLE".to_string(),
            category: "words".to_string(),
            path: "elsewhere.mp4".to_string(),
            kind: MediaKind::Image,
        });

        let bank = DictionaryQuestionBank::new(entries, 4);
        assert_eq!(bank.len(), sample_dictionary().len());
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let bank = DictionaryQuestionBank::new(sample_dictionary(), 4);

        let media = bank.lookup("Thank You").await.unwrap();
        assert_eq!(media.word, "thank you");
        assert_eq!(media.kind, MediaKind::Video);
        assert!(bank.lookup("zebra").await.is_none());
    }

    #[test]
    fn test_load_from_json_file() {
        let path =
            std::env::temp_dir().join(format!("signquiz-dict-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"[
                {"word": "one", "path": "n/1.mp4"},
                {"word": "two", "path": "n/2.png", "kind": "image"}
            ]"#,
        )
        .unwrap();

        let bank = DictionaryQuestionBank::from_json_file(&path, 4).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(bank.len(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = DictionaryQuestionBank::from_json_file(Path::new("/nonexistent/dict.json"), 4);
        assert!(matches!(result, Err(QuestionBankError::Io(_))));
    }
}
