//! In-memory `WordStore` for unit and router tests.
//!
//! Any operation can be made to fail with a transient database error via
//! `fail_on`, which is how the error-policy tests exercise swallow vs surface.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::learner_word::{LearnerWordState, NewLearnerWord, StateWithEntry, WordStatus};
use crate::models::profile::{LearnerProfile, Subscription};
use crate::models::vocabulary::VocabularyEntry;
use crate::scheduler::store::{
    CatalogFilter, CatalogStore, LearnerStateStore, ProfileStore, StateOrder,
};

#[derive(Default)]
struct Inner {
    entries: Vec<VocabularyEntry>,
    states: Vec<LearnerWordState>,
    profiles: HashMap<Uuid, LearnerProfile>,
    subscriptions: HashMap<Uuid, Subscription>,
    tick: i64,
}

impl Inner {
    /// Strictly increasing timestamps so insertion order is observable.
    fn next_instant(&mut self) -> DateTime<Utc> {
        self.tick += 1;
        base_instant() + Duration::milliseconds(self.tick)
    }
}

fn base_instant() -> DateTime<Utc> {
    Utc::now() - Duration::days(365)
}

#[derive(Default)]
pub struct MemoryWordStore {
    inner: Mutex<Inner>,
    failing: Mutex<HashSet<&'static str>>,
}

impl MemoryWordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call to `operation` fail until `recover` is called.
    pub fn fail_on(&self, operation: &'static str) {
        self.failing.lock().unwrap().insert(operation);
    }

    pub fn recover(&self, operation: &'static str) {
        self.failing.lock().unwrap().remove(operation);
    }

    fn check(&self, operation: &'static str) -> Result<(), AppError> {
        if self.failing.lock().unwrap().contains(operation) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    pub fn add_entry(&self, english: &str, priority: i32, category: &str, level: Option<&str>) -> VocabularyEntry {
        let mut inner = self.inner.lock().unwrap();
        let entry = VocabularyEntry {
            id: Uuid::new_v4(),
            english_word: english.to_string(),
            hebrew_translation: format!("{english}-he"),
            category: category.to_string(),
            level: level.map(str::to_string),
            example_sentence: Some(format!("I like the {english} - אני אוהב את ה{english}")),
            priority,
            pronunciation: None,
            created_at: inner.next_instant(),
        };
        inner.entries.push(entry.clone());
        entry
    }

    /// Adds a catalog entry plus a learner state pointing at it.
    pub fn add_word(&self, user_id: Uuid, english: &str, priority: i32, status: WordStatus) -> (LearnerWordState, VocabularyEntry) {
        let entry = self.add_entry(english, priority, "general", Some("basic"));
        let state = self.add_state(user_id, entry.id, status);
        (state, entry)
    }

    pub fn add_state(&self, user_id: Uuid, word_id: Uuid, status: WordStatus) -> LearnerWordState {
        let mut inner = self.inner.lock().unwrap();
        let at = inner.next_instant();
        let state = LearnerWordState {
            id: Uuid::new_v4(),
            user_id,
            word_id,
            status,
            view_count: 0,
            last_seen: None,
            last_practiced_at: None,
            created_at: at,
            updated_at: at,
        };
        inner.states.push(state.clone());
        state
    }

    pub fn set_last_practiced(&self, state_id: Uuid, at: Option<DateTime<Utc>>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(state) = inner.states.iter_mut().find(|s| s.id == state_id) {
            state.last_practiced_at = at;
        }
    }

    pub fn set_updated_at(&self, state_id: Uuid, at: DateTime<Utc>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(state) = inner.states.iter_mut().find(|s| s.id == state_id) {
            state.updated_at = at;
        }
    }

    pub fn remove_entry(&self, entry_id: Uuid) {
        self.inner.lock().unwrap().entries.retain(|e| e.id != entry_id);
    }

    pub fn put_profile(&self, profile: LearnerProfile) {
        self.inner.lock().unwrap().profiles.insert(profile.user_id, profile);
    }

    pub fn put_subscription(&self, subscription: Subscription) {
        self.inner
            .lock()
            .unwrap()
            .subscriptions
            .insert(subscription.user_id, subscription);
    }

    pub fn states_for(&self, user_id: Uuid) -> Vec<LearnerWordState> {
        self.inner
            .lock()
            .unwrap()
            .states
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn state(&self, state_id: Uuid) -> Option<LearnerWordState> {
        self.inner
            .lock()
            .unwrap()
            .states
            .iter()
            .find(|s| s.id == state_id)
            .cloned()
    }
}

#[async_trait]
impl CatalogStore for MemoryWordStore {
    async fn query_entries(&self, filter: &CatalogFilter) -> Result<Vec<VocabularyEntry>, AppError> {
        self.check("query_entries")?;
        let inner = self.inner.lock().unwrap();
        let mut entries: Vec<_> = inner
            .entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        if let Some(limit) = filter.limit {
            entries.truncate(limit.max(0) as usize);
        }
        Ok(entries)
    }

    async fn sample_entries(&self, limit: i64) -> Result<Vec<VocabularyEntry>, AppError> {
        self.check("sample_entries")?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.entries.iter().take(limit.max(0) as usize).cloned().collect())
    }
}

#[async_trait]
impl LearnerStateStore for MemoryWordStore {
    async fn upsert_states(&self, records: &[NewLearnerWord]) -> Result<u64, AppError> {
        self.check("upsert_states")?;
        let mut inner = self.inner.lock().unwrap();
        let mut inserted = 0;
        for record in records {
            let exists = inner
                .states
                .iter()
                .any(|s| s.user_id == record.user_id && s.word_id == record.word_id);
            if exists {
                continue;
            }
            let at = inner.next_instant();
            inner.states.push(LearnerWordState {
                id: Uuid::new_v4(),
                user_id: record.user_id,
                word_id: record.word_id,
                status: WordStatus::New,
                view_count: 0,
                last_seen: None,
                last_practiced_at: None,
                created_at: at,
                updated_at: at,
            });
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn query_states(
        &self,
        learner_id: Uuid,
        status_in: &[WordStatus],
        order: StateOrder,
    ) -> Result<Vec<StateWithEntry>, AppError> {
        self.check("query_states")?;
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<StateWithEntry> = inner
            .states
            .iter()
            .filter(|s| s.user_id == learner_id && status_in.contains(&s.status))
            .map(|s| StateWithEntry {
                state: s.clone(),
                entry: inner.entries.iter().find(|e| e.id == s.word_id).cloned(),
            })
            .collect();
        // Scheduling order is left as insertion order on purpose: the
        // selector must not depend on the backend sorting for it.
        if order == StateOrder::RecentlyUpdated {
            rows.sort_by(|a, b| b.state.updated_at.cmp(&a.state.updated_at));
        }
        Ok(rows)
    }

    async fn count_states(&self, learner_id: Uuid, status_in: &[WordStatus]) -> Result<i64, AppError> {
        self.check("count_states")?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .states
            .iter()
            .filter(|s| s.user_id == learner_id && status_in.contains(&s.status))
            .count() as i64)
    }

    async fn update_status(
        &self,
        ids: &[Uuid],
        status: WordStatus,
        at: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        self.check("update_status")?;
        let mut inner = self.inner.lock().unwrap();
        let mut updated = 0;
        for state in inner.states.iter_mut().filter(|s| ids.contains(&s.id)) {
            state.status = status;
            state.updated_at = at;
            if status == WordStatus::Learned {
                state.last_practiced_at = Some(at);
            }
            updated += 1;
        }
        Ok(updated)
    }

    async fn assigned_word_ids(&self, learner_id: Uuid) -> Result<HashSet<Uuid>, AppError> {
        self.check("assigned_word_ids")?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .states
            .iter()
            .filter(|s| s.user_id == learner_id)
            .map(|s| s.word_id)
            .collect())
    }

    async fn assigned_categories(&self, learner_id: Uuid) -> Result<HashSet<String>, AppError> {
        self.check("assigned_categories")?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .states
            .iter()
            .filter(|s| s.user_id == learner_id)
            .filter_map(|s| inner.entries.iter().find(|e| e.id == s.word_id))
            .map(|e| e.category.clone())
            .collect())
    }

    async fn record_view(&self, learner_id: Uuid, word_id: Uuid, at: DateTime<Utc>) -> Result<bool, AppError> {
        self.check("record_view")?;
        let mut inner = self.inner.lock().unwrap();
        match inner
            .states
            .iter_mut()
            .find(|s| s.user_id == learner_id && s.word_id == word_id)
        {
            Some(state) => {
                state.view_count += 1;
                state.last_seen = Some(at);
                state.updated_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn reset_status(
        &self,
        learner_id: Uuid,
        word_id: Uuid,
        status: WordStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        self.check("reset_status")?;
        let mut inner = self.inner.lock().unwrap();
        match inner
            .states
            .iter_mut()
            .find(|s| s.user_id == learner_id && s.word_id == word_id)
        {
            Some(state) => {
                state.status = status;
                state.updated_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_learned_since(&self, learner_id: Uuid, since: DateTime<Utc>) -> Result<i64, AppError> {
        self.check("count_learned_since")?;
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .states
            .iter()
            .filter(|s| {
                s.user_id == learner_id
                    && s.status == WordStatus::Learned
                    && s.last_practiced_at.is_some_and(|at| at >= since)
            })
            .count() as i64)
    }
}

#[async_trait]
impl ProfileStore for MemoryWordStore {
    async fn learner_profile(&self, learner_id: Uuid) -> Result<Option<LearnerProfile>, AppError> {
        self.check("learner_profile")?;
        Ok(self.inner.lock().unwrap().profiles.get(&learner_id).cloned())
    }

    async fn subscription(&self, learner_id: Uuid) -> Result<Option<Subscription>, AppError> {
        self.check("subscription")?;
        Ok(self.inner.lock().unwrap().subscriptions.get(&learner_id).cloned())
    }
}
