//! WordPoolReplenisher: keeps a minimum number of unseen/queued words in a
//! learner's personal pool by pulling from the shared catalog.
//!
//! This is background maintenance: store failures are logged and swallowed,
//! and the session proceeds with whatever words already exist.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::num::NonZeroU32;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::learner_word::{NewLearnerWord, WordStatus};
use crate::models::vocabulary::VocabularyEntry;
use crate::scheduler::levels::{catalog_categories, catalog_levels};
use crate::scheduler::store::{CatalogFilter, WordStore};

/// Upper bound on catalog rows considered per top-up.
const CANDIDATE_WINDOW: i64 = 200;

#[derive(Clone)]
pub struct WordPoolReplenisher {
    store: Arc<dyn WordStore>,
}

impl WordPoolReplenisher {
    pub fn new(store: Arc<dyn WordStore>) -> Self {
        Self { store }
    }

    /// Tops the learner's `new`/`queued` pool up to `min_count`.
    ///
    /// Returns how many states were created. A store failure yields 0 after
    /// a warning; it never propagates.
    pub async fn ensure_minimum(
        &self,
        learner_id: Uuid,
        level: &str,
        category: &str,
        min_count: NonZeroU32,
    ) -> u64 {
        match self.try_ensure_minimum(learner_id, level, category, min_count).await {
            Ok(inserted) => inserted,
            Err(e) => {
                warn!(%learner_id, "word pool replenish failed, continuing with existing pool: {e}");
                0
            }
        }
    }

    async fn try_ensure_minimum(
        &self,
        learner_id: Uuid,
        level: &str,
        category: &str,
        min_count: NonZeroU32,
    ) -> Result<u64, AppError> {
        let available = self.store.count_states(learner_id, &WordStatus::POOL).await?;
        let min_count = i64::from(min_count.get());
        if available >= min_count {
            debug!(%learner_id, available, min_count, "word pool already full");
            return Ok(0);
        }
        let shortfall = (min_count - available) as usize;

        let assigned: Vec<Uuid> = self
            .store
            .assigned_word_ids(learner_id)
            .await?
            .into_iter()
            .collect();

        let filter = CatalogFilter {
            levels: catalog_levels(level),
            categories: catalog_categories(category),
            exclude_ids: assigned.clone(),
            limit: Some(CANDIDATE_WINDOW),
        };
        let mut candidates = self.store.query_entries(&filter).await?;

        if candidates.is_empty() && !filter.is_unfiltered() {
            info!(%learner_id, level, category, "no catalog words match, falling back to general catalog");
            let general = CatalogFilter {
                exclude_ids: assigned,
                limit: Some(CANDIDATE_WINDOW),
                ..Default::default()
            };
            candidates = self.store.query_entries(&general).await?;
        }

        if candidates.is_empty() {
            debug!(%learner_id, "catalog exhausted for learner");
            return Ok(0);
        }

        let known_categories = self.store.assigned_categories(learner_id).await?;
        let records: Vec<NewLearnerWord> = pick_top_up(candidates, &known_categories, shortfall)
            .into_iter()
            .map(|entry| NewLearnerWord {
                user_id: learner_id,
                word_id: entry.id,
            })
            .collect();

        let inserted = self.store.upsert_states(&records).await?;
        info!(%learner_id, shortfall, inserted, "word pool replenished");
        Ok(inserted)
    }
}

/// Orders catalog candidates for a top-up and keeps the first `shortfall`.
///
/// Priority descending; ties prefer categories the learner has not been
/// assigned yet; then catalog insertion order.
fn pick_top_up(
    mut candidates: Vec<VocabularyEntry>,
    known_categories: &HashSet<String>,
    shortfall: usize,
) -> Vec<VocabularyEntry> {
    candidates.sort_by(|a, b| compare_candidates(a, b, known_categories));
    candidates.dedup_by_key(|e| e.id);
    candidates.truncate(shortfall);
    candidates
}

fn compare_candidates(
    a: &VocabularyEntry,
    b: &VocabularyEntry,
    known_categories: &HashSet<String>,
) -> Ordering {
    let seen = |e: &VocabularyEntry| known_categories.contains(&e.category);
    b.priority
        .cmp(&a.priority)
        .then_with(|| seen(a).cmp(&seen(b)))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}
