//! SessionSelector: turns a learner's current word states into an ordered,
//! bounded batch.
//!
//! Every call re-reads the store; nothing is cached across sessions so an
//! "unlearn" in the library view is picked up by the next batch.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::errors::AppError;
use crate::models::learner_word::{StateWithEntry, WordStatus};
use crate::scheduler::batch::{BatchItem, SessionBatch};
use crate::scheduler::ordering::scheduling_key;
use crate::scheduler::store::{StateOrder, WordStore};

/// How due `learned` words take part in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewMode {
    /// Only `new`/`queued` words.
    Exclude,
    /// Due reviews after all `new`/`queued` words.
    Append,
    /// Due reviews sorted together with `new` words.
    Interleave,
}

/// The four session consumers and their batch shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Lesson,
    Practice,
    Flashcards,
    Quiz,
}

impl SessionKind {
    pub fn batch_size(&self, config: &SchedulerConfig) -> usize {
        match self {
            SessionKind::Lesson => config.lesson_size,
            SessionKind::Practice => config.practice_size,
            SessionKind::Flashcards | SessionKind::Quiz => config.deck_size,
        }
    }

    pub fn review_mode(&self) -> ReviewMode {
        match self {
            SessionKind::Lesson => ReviewMode::Exclude,
            SessionKind::Practice => ReviewMode::Interleave,
            SessionKind::Flashcards | SessionKind::Quiz => ReviewMode::Append,
        }
    }
}

/// Spaced-repetition window: a learned word is due again once it has not been
/// practiced for `window`, or was never practiced at all.
#[derive(Debug, Clone, Copy)]
pub struct ReviewPolicy {
    pub window: Duration,
}

impl ReviewPolicy {
    pub fn from_days(days: i64) -> Self {
        Self {
            window: Duration::days(days),
        }
    }

    pub fn is_due(&self, last_practiced_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match last_practiced_at {
            None => true,
            Some(at) => at < now - self.window,
        }
    }
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self::from_days(7)
    }
}

#[derive(Clone)]
pub struct SessionSelector {
    store: Arc<dyn WordStore>,
    review: ReviewPolicy,
}

impl SessionSelector {
    pub fn new(store: Arc<dyn WordStore>, review: ReviewPolicy) -> Self {
        Self { store, review }
    }

    /// Builds a batch of at most `max_size` words. Store failures surface;
    /// an empty batch is a valid "nothing to do right now".
    pub async fn build_batch(
        &self,
        learner_id: Uuid,
        max_size: usize,
        mode: ReviewMode,
    ) -> Result<SessionBatch, AppError> {
        if max_size == 0 {
            return Ok(SessionBatch::new(learner_id, Vec::new()));
        }

        let statuses: &[WordStatus] = match mode {
            ReviewMode::Exclude => &WordStatus::POOL,
            ReviewMode::Append | ReviewMode::Interleave => {
                &[WordStatus::Queued, WordStatus::New, WordStatus::Learned]
            }
        };
        let rows = self
            .store
            .query_states(learner_id, statuses, StateOrder::Scheduling)
            .await?;

        let items = assemble_batch(rows, mode, &self.review, Utc::now(), max_size);
        debug!(%learner_id, size = items.len(), ?mode, "batch built");
        Ok(SessionBatch::new(learner_id, items))
    }
}

/// Pure batch assembly: drop orphans, apply the review rule, order, dedupe, cap.
pub fn assemble_batch(
    rows: Vec<StateWithEntry>,
    mode: ReviewMode,
    review: &ReviewPolicy,
    now: DateTime<Utc>,
    max_size: usize,
) -> Vec<BatchItem> {
    let mut primary = Vec::new();
    let mut reviews = Vec::new();

    for row in rows {
        let Some(entry) = row.entry else {
            warn!(
                state_id = %row.state.id,
                word_id = %row.state.word_id,
                "learner word state references a missing vocabulary entry, skipping"
            );
            continue;
        };
        let item = BatchItem {
            state: row.state,
            entry,
        };
        match item.state.status {
            WordStatus::New | WordStatus::Queued => primary.push(item),
            WordStatus::Learned => {
                if mode != ReviewMode::Exclude && review.is_due(item.state.last_practiced_at, now) {
                    reviews.push(item);
                }
            }
        }
    }

    primary.sort_by_cached_key(|item| scheduling_key(item, mode));
    match mode {
        ReviewMode::Exclude => {}
        ReviewMode::Append => {
            reviews.sort_by_cached_key(|item| scheduling_key(item, mode));
            primary.extend(reviews);
        }
        ReviewMode::Interleave => {
            primary.extend(reviews);
            primary.sort_by_cached_key(|item| scheduling_key(item, mode));
        }
    }

    let mut seen = HashSet::new();
    primary.retain(|item| seen.insert(item.word_id()));
    primary.truncate(max_size);
    primary
}
