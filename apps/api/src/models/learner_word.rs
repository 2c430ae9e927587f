use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::vocabulary::VocabularyEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordStatus {
    New,
    Queued,
    Learned,
}

impl WordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WordStatus::New => "new",
            WordStatus::Queued => "queued",
            WordStatus::Learned => "learned",
        }
    }

    /// Statuses that count towards the learner's available pool.
    pub const POOL: [WordStatus; 2] = [WordStatus::New, WordStatus::Queued];
}

impl fmt::Display for WordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(WordStatus::New),
            "queued" => Ok(WordStatus::Queued),
            "learned" => Ok(WordStatus::Learned),
            other => Err(format!("unknown word status '{other}'")),
        }
    }
}

/// Per learner × catalog entry progress. Exactly one per (user_id, word_id).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LearnerWordState {
    pub id: Uuid,
    pub user_id: Uuid,
    pub word_id: Uuid,
    pub status: WordStatus,
    pub view_count: i32,
    pub last_seen: Option<DateTime<Utc>>,
    pub last_practiced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a lazily created state. Always starts as `new` with no views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLearnerWord {
    pub user_id: Uuid,
    pub word_id: Uuid,
}

/// A state joined with its catalog entry. The entry is `None` when the
/// referenced catalog row no longer exists.
#[derive(Debug, Clone)]
pub struct StateWithEntry {
    pub state: LearnerWordState,
    pub entry: Option<VocabularyEntry>,
}

/// Flat row for `user_words LEFT JOIN vocabulary_words`.
#[derive(Debug, FromRow)]
pub struct StateWithEntryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub word_id: Uuid,
    pub status: String,
    pub view_count: i32,
    pub last_seen: Option<DateTime<Utc>>,
    pub last_practiced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub v_id: Option<Uuid>,
    pub v_english_word: Option<String>,
    pub v_hebrew_translation: Option<String>,
    pub v_category: Option<String>,
    pub v_level: Option<String>,
    pub v_example_sentence: Option<String>,
    pub v_priority: Option<i32>,
    pub v_pronunciation: Option<String>,
    pub v_created_at: Option<DateTime<Utc>>,
}

impl TryFrom<StateWithEntryRow> for StateWithEntry {
    type Error = String;

    fn try_from(row: StateWithEntryRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<WordStatus>()?;

        let entry = match (
            row.v_id,
            row.v_english_word,
            row.v_hebrew_translation,
            row.v_category,
            row.v_created_at,
        ) {
            (Some(id), Some(english_word), Some(hebrew_translation), Some(category), Some(created_at)) => {
                Some(VocabularyEntry {
                    id,
                    english_word,
                    hebrew_translation,
                    category,
                    level: row.v_level,
                    example_sentence: row.v_example_sentence,
                    priority: row.v_priority.unwrap_or(0),
                    pronunciation: row.v_pronunciation,
                    created_at,
                })
            }
            _ => None,
        };

        Ok(StateWithEntry {
            state: LearnerWordState {
                id: row.id,
                user_id: row.user_id,
                word_id: row.word_id,
                status,
                view_count: row.view_count,
                last_seen: row.last_seen,
                last_practiced_at: row.last_practiced_at,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            entry,
        })
    }
}
