use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A shared catalog entry. Read-only from the scheduler's point of view.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct VocabularyEntry {
    pub id: Uuid,
    pub english_word: String,
    pub hebrew_translation: String,
    pub category: String,
    pub level: Option<String>,
    pub example_sentence: Option<String>,
    pub priority: i32,
    pub pronunciation: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl VocabularyEntry {
    /// Splits a stored `"<english> - <hebrew>"` example into its halves.
    /// Sentences without the separator come back whole with no translation.
    pub fn example_parts(&self) -> Option<(&str, Option<&str>)> {
        let sentence = self.example_sentence.as_deref()?.trim();
        if sentence.is_empty() {
            return None;
        }
        match sentence.split_once(" - ") {
            Some((source, target)) => Some((source.trim(), Some(target.trim()))),
            None => Some((sentence, None)),
        }
    }

    pub fn has_example(&self) -> bool {
        self.example_parts().is_some()
    }
}
