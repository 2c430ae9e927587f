use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::learner_word::{NewLearnerWord, StateWithEntry, StateWithEntryRow, WordStatus};
use crate::models::profile::{LearnerProfile, Subscription};
use crate::models::vocabulary::VocabularyEntry;
use crate::scheduler::store::{
    CatalogFilter, CatalogStore, LearnerStateStore, ProfileStore, StateOrder,
};

const VOCABULARY_COLUMNS: &str = "id, english_word, hebrew_translation, category, level, \
     example_sentence, priority, pronunciation, created_at";

/// PostgreSQL-backed catalog and learner-state store.
#[derive(Clone)]
pub struct PgWordStore {
    pool: PgPool,
}

impl PgWordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn status_strings(statuses: &[WordStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

#[async_trait]
impl CatalogStore for PgWordStore {
    async fn query_entries(&self, filter: &CatalogFilter) -> Result<Vec<VocabularyEntry>, AppError> {
        let mut qb = QueryBuilder::<sqlx::Postgres>::new("SELECT ");
        qb.push(VOCABULARY_COLUMNS);
        qb.push(" FROM vocabulary_words WHERE TRUE");

        if !filter.levels.is_empty() {
            qb.push(" AND level = ANY(");
            qb.push_bind(filter.levels.clone());
            qb.push(")");
        }
        if !filter.categories.is_empty() {
            qb.push(" AND category = ANY(");
            qb.push_bind(filter.categories.clone());
            qb.push(")");
        }
        if !filter.exclude_ids.is_empty() {
            qb.push(" AND NOT (id = ANY(");
            qb.push_bind(filter.exclude_ids.clone());
            qb.push("))");
        }
        qb.push(" ORDER BY priority DESC, created_at ASC, id ASC");
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit);
        }

        let entries = qb
            .build_query_as::<VocabularyEntry>()
            .fetch_all(&self.pool)
            .await?;
        debug!(count = entries.len(), "catalog query");
        Ok(entries)
    }

    async fn sample_entries(&self, limit: i64) -> Result<Vec<VocabularyEntry>, AppError> {
        Ok(sqlx::query_as::<_, VocabularyEntry>(&format!(
            "SELECT {VOCABULARY_COLUMNS} FROM vocabulary_words ORDER BY random() LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl LearnerStateStore for PgWordStore {
    async fn upsert_states(&self, records: &[NewLearnerWord]) -> Result<u64, AppError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut qb = QueryBuilder::<sqlx::Postgres>::new(
            "INSERT INTO user_words (user_id, word_id, status, view_count) ",
        );
        qb.push_values(records, |mut row, record| {
            row.push_bind(record.user_id)
                .push_bind(record.word_id)
                .push_bind(WordStatus::New.as_str())
                .push_bind(0_i32);
        });
        qb.push(" ON CONFLICT (user_id, word_id) DO NOTHING");

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn query_states(
        &self,
        learner_id: Uuid,
        status_in: &[WordStatus],
        order: StateOrder,
    ) -> Result<Vec<StateWithEntry>, AppError> {
        let order_clause = match order {
            StateOrder::Scheduling => {
                "CASE uw.status WHEN 'queued' THEN 0 WHEN 'new' THEN 1 ELSE 2 END, \
                 vw.priority DESC NULLS LAST, uw.created_at ASC, uw.id ASC"
            }
            StateOrder::RecentlyUpdated => "uw.updated_at DESC, uw.id ASC",
        };

        let rows = sqlx::query_as::<_, StateWithEntryRow>(&format!(
            r#"
            SELECT uw.id, uw.user_id, uw.word_id, uw.status, uw.view_count,
                   uw.last_seen, uw.last_practiced_at, uw.created_at, uw.updated_at,
                   vw.id AS v_id, vw.english_word AS v_english_word,
                   vw.hebrew_translation AS v_hebrew_translation, vw.category AS v_category,
                   vw.level AS v_level, vw.example_sentence AS v_example_sentence,
                   vw.priority AS v_priority, vw.pronunciation AS v_pronunciation,
                   vw.created_at AS v_created_at
            FROM user_words uw
            LEFT JOIN vocabulary_words vw ON vw.id = uw.word_id
            WHERE uw.user_id = $1 AND uw.status = ANY($2)
            ORDER BY {order_clause}
            "#
        ))
        .bind(learner_id)
        .bind(status_strings(status_in))
        .fetch_all(&self.pool)
        .await?;

        let mut states = Vec::with_capacity(rows.len());
        for row in rows {
            match StateWithEntry::try_from(row) {
                Ok(state) => states.push(state),
                Err(e) => warn!(%learner_id, "skipping malformed learner word state: {e}"),
            }
        }
        Ok(states)
    }

    async fn count_states(&self, learner_id: Uuid, status_in: &[WordStatus]) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_words WHERE user_id = $1 AND status = ANY($2)",
        )
        .bind(learner_id)
        .bind(status_strings(status_in))
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_status(
        &self,
        ids: &[Uuid],
        status: WordStatus,
        at: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query(
            r#"
            UPDATE user_words
            SET status = $1,
                updated_at = $2,
                last_practiced_at = CASE WHEN $1 = 'learned' THEN $2 ELSE last_practiced_at END
            WHERE id = ANY($3)
            "#,
        )
        .bind(status.as_str())
        .bind(at)
        .bind(ids)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn assigned_word_ids(&self, learner_id: Uuid) -> Result<HashSet<Uuid>, AppError> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT word_id FROM user_words WHERE user_id = $1")
            .bind(learner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids.into_iter().collect())
    }

    async fn assigned_categories(&self, learner_id: Uuid) -> Result<HashSet<String>, AppError> {
        let categories: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT vw.category
            FROM user_words uw
            JOIN vocabulary_words vw ON vw.id = uw.word_id
            WHERE uw.user_id = $1
            "#,
        )
        .bind(learner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories.into_iter().collect())
    }

    async fn record_view(&self, learner_id: Uuid, word_id: Uuid, at: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE user_words
            SET view_count = view_count + 1, last_seen = $3, updated_at = $3
            WHERE user_id = $1 AND word_id = $2
            "#,
        )
        .bind(learner_id)
        .bind(word_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn reset_status(
        &self,
        learner_id: Uuid,
        word_id: Uuid,
        status: WordStatus,
        at: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE user_words SET status = $3, updated_at = $4 WHERE user_id = $1 AND word_id = $2",
        )
        .bind(learner_id)
        .bind(word_id)
        .bind(status.as_str())
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_learned_since(&self, learner_id: Uuid, since: DateTime<Utc>) -> Result<i64, AppError> {
        Ok(sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_words WHERE user_id = $1 AND status = 'learned' AND last_practiced_at >= $2",
        )
        .bind(learner_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?)
    }
}

#[async_trait]
impl ProfileStore for PgWordStore {
    async fn learner_profile(&self, learner_id: Uuid) -> Result<Option<LearnerProfile>, AppError> {
        Ok(sqlx::query_as::<_, LearnerProfile>(
            "SELECT user_id, english_level, interest_topics FROM profiles WHERE user_id = $1",
        )
        .bind(learner_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn subscription(&self, learner_id: Uuid) -> Result<Option<Subscription>, AppError> {
        Ok(sqlx::query_as::<_, Subscription>(
            "SELECT user_id, status, current_period_end FROM subscriptions WHERE user_id = $1",
        )
        .bind(learner_id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
