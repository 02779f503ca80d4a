use serde::{Deserialize, Serialize};

/// A single quiz item, immutable once selected into a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub correct_answer: String,
    /// Distinct options, one of which is the correct answer
    pub options: Vec<String>,
    /// Dictionary word whose sign media accompanies the question
    pub media_key: Option<String>,
}

impl Question {
    /// Case-insensitive exact match against the correct answer
    pub fn is_correct(&self, answer: &str) -> bool {
        answer.trim().to_lowercase() == self.correct_answer.trim().to_lowercase()
    }

    /// Resolves an option index from a button payload into its text
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Image,
}

/// One sign in the dictionary store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub word: String,
    #[serde(default)]
    pub category: String,
    pub path: String,
    #[serde(default = "default_media_kind")]
    pub kind: MediaKind,
}

fn default_media_kind() -> MediaKind {
    MediaKind::Video
}

/// What the transport needs to deliver the sign for a word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub word: String,
    pub path: String,
    pub kind: MediaKind,
}

impl From<&DictionaryEntry> for MediaDescriptor {
    fn from(entry: &DictionaryEntry) -> Self {
        Self {
            word: entry.word.clone(),
            path: entry.path.clone(),
            kind: entry.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn question() -> Question {
        Question {
            prompt: "Which word does this sign show?".to_string(),
            correct_answer: "Thank you".to_string(),
            options: vec!["hello".into(), "Thank you".into(), "apple".into()],
            media_key: Some("thank you".to_string()),
        }
    }

    #[rstest]
    #[case("Thank you", true)]
    #[case("thank you", true)]
    #[case("  THANK YOU ", true)]
    #[case("thankyou", false)]
    #[case("hello", false)]
    #[case("", false)]
    fn test_answer_matching_is_case_insensitive(#[case] answer: &str, #[case] expected: bool) {
        assert_eq!(question().is_correct(answer), expected);
    }

    #[test]
    fn test_option_lookup_by_index() {
        let q = question();
        assert_eq!(q.option(1), Some("Thank you"));
        assert_eq!(q.option(3), None);
    }

    #[test]
    fn test_dictionary_entry_defaults() {
        let entry: DictionaryEntry =
            serde_json::from_str(r#"{"word": "apple", "path": "videos/words/apple.mp4"}"#)
                .unwrap();

        assert_eq!(entry.kind, MediaKind::Video);
        assert!(entry.category.is_empty());
    }
}
