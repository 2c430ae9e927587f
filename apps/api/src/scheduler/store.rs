//! Store contracts the scheduler depends on.
//!
//! `PgWordStore` is the production backend. Tests run against the in-memory
//! store in `memory_store`. `AppState` carries an `Arc<dyn WordStore>`.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::learner_word::{NewLearnerWord, StateWithEntry, WordStatus};
use crate::models::profile::{LearnerProfile, Subscription};
use crate::models::vocabulary::VocabularyEntry;

/// Catalog query filter. Empty `levels`/`categories` mean "no filter".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogFilter {
    pub levels: Vec<String>,
    pub categories: Vec<String>,
    pub exclude_ids: Vec<Uuid>,
    pub limit: Option<i64>,
}

impl CatalogFilter {
    pub fn is_unfiltered(&self) -> bool {
        self.levels.is_empty() && self.categories.is_empty()
    }

    /// Whether a catalog entry passes the level, category and exclusion clauses.
    #[cfg(test)]
    pub fn matches(&self, entry: &VocabularyEntry) -> bool {
        let level_ok = self.levels.is_empty()
            || entry
                .level
                .as_ref()
                .is_some_and(|level| self.levels.contains(level));
        let category_ok = self.categories.is_empty() || self.categories.contains(&entry.category);
        level_ok && category_ok && !self.exclude_ids.contains(&entry.id)
    }
}

/// Row order for `query_states`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateOrder {
    /// queued before new, priority desc, created_at asc. The selector
    /// re-sorts with its own comparator, so this is only a hint to the backend.
    Scheduling,
    /// Most recently updated first, for library listings.
    RecentlyUpdated,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn query_entries(&self, filter: &CatalogFilter) -> Result<Vec<VocabularyEntry>, AppError>;

    /// Arbitrary catalog sample used for challenge distractors.
    async fn sample_entries(&self, limit: i64) -> Result<Vec<VocabularyEntry>, AppError>;
}

#[async_trait]
pub trait LearnerStateStore: Send + Sync {
    /// Inserts states, ignoring (learner, entry) pairs that already exist.
    /// Returns the number of rows actually created.
    async fn upsert_states(&self, records: &[NewLearnerWord]) -> Result<u64, AppError>;

    async fn query_states(
        &self,
        learner_id: Uuid,
        status_in: &[WordStatus],
        order: StateOrder,
    ) -> Result<Vec<StateWithEntry>, AppError>;

    async fn count_states(&self, learner_id: Uuid, status_in: &[WordStatus]) -> Result<i64, AppError>;

    /// Sets `status` on the given state ids, stamping `updated_at`, and
    /// `last_practiced_at` as well when moving to `learned`.
    async fn update_status(
        &self,
        ids: &[Uuid],
        status: WordStatus,
        at: DateTime<Utc>,
    ) -> Result<u64, AppError>;

    /// Catalog ids the learner already has a state for, in any status.
    async fn assigned_word_ids(&self, learner_id: Uuid) -> Result<HashSet<Uuid>, AppError>;

    /// Categories of all catalog entries the learner already has a state for.
    async fn assigned_categories(&self, learner_id: Uuid) -> Result<HashSet<String>, AppError>;

    /// Bumps `view_count` and stamps `last_seen`. Returns false if no state exists.
    async fn record_view(&self, learner_id: Uuid, word_id: Uuid, at: DateTime<Utc>) -> Result<bool, AppError>;

    /// Sets the status of one (learner, entry) state. Returns false if no state exists.
    async fn reset_status(
        &self,
        learner_id: Uuid,
        word_id: Uuid,
        status: WordStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    /// Number of `learned` states last practiced at or after `since`.
    async fn count_learned_since(&self, learner_id: Uuid, since: DateTime<Utc>) -> Result<i64, AppError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn learner_profile(&self, learner_id: Uuid) -> Result<Option<LearnerProfile>, AppError>;

    async fn subscription(&self, learner_id: Uuid) -> Result<Option<Subscription>, AppError>;
}

/// Everything the scheduler and its HTTP surface need from persistence.
pub trait WordStore: CatalogStore + LearnerStateStore + ProfileStore {}

impl<T> WordStore for T where T: CatalogStore + LearnerStateStore + ProfileStore {}
