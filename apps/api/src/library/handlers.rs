use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::library::daily_limit::{daily_limit_report, DailyLimitReport};
use crate::models::learner_word::{StateWithEntry, WordStatus};
use crate::models::vocabulary::VocabularyEntry;
use crate::scheduler::store::StateOrder;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WordListQuery {
    /// Comma-separated statuses. Defaults to `learned`.
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LibraryWord {
    pub state_id: Uuid,
    pub status: WordStatus,
    pub view_count: i32,
    pub last_seen: Option<chrono::DateTime<Utc>>,
    pub last_practiced_at: Option<chrono::DateTime<Utc>>,
    pub updated_at: chrono::DateTime<Utc>,
    pub word: VocabularyEntry,
}

#[derive(Debug, Serialize)]
pub struct UnlearnResponse {
    pub word_id: Uuid,
    pub status: WordStatus,
}

fn parse_statuses(raw: Option<&str>) -> Result<Vec<WordStatus>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(vec![WordStatus::Learned]);
    };
    let mut statuses = Vec::new();
    for piece in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let status: WordStatus = piece.parse().map_err(AppError::Validation)?;
        if !statuses.contains(&status) {
            statuses.push(status);
        }
    }
    Ok(statuses)
}

/// GET /api/v1/learners/:id/words
pub async fn handle_list_words(
    State(state): State<AppState>,
    Path(learner_id): Path<Uuid>,
    Query(params): Query<WordListQuery>,
) -> Result<Json<Vec<LibraryWord>>, AppError> {
    let statuses = parse_statuses(params.status.as_deref())?;
    let rows = state
        .store
        .query_states(learner_id, &statuses, StateOrder::RecentlyUpdated)
        .await?;

    let words = rows
        .into_iter()
        .filter_map(|StateWithEntry { state, entry }| {
            entry.map(|word| LibraryWord {
                state_id: state.id,
                status: state.status,
                view_count: state.view_count,
                last_seen: state.last_seen,
                last_practiced_at: state.last_practiced_at,
                updated_at: state.updated_at,
                word,
            })
        })
        .collect();
    Ok(Json(words))
}

/// POST /api/v1/learners/:id/words/:word_id/unlearn
pub async fn handle_unlearn(
    State(state): State<AppState>,
    Path((learner_id, word_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<UnlearnResponse>, AppError> {
    let found = state
        .store
        .reset_status(learner_id, word_id, WordStatus::New, Utc::now())
        .await?;
    if !found {
        return Err(AppError::NotFound(format!(
            "Word {word_id} is not in learner {learner_id}'s list"
        )));
    }
    info!(%learner_id, %word_id, "word moved back to new");
    Ok(Json(UnlearnResponse {
        word_id,
        status: WordStatus::New,
    }))
}

/// GET /api/v1/learners/:id/daily-limit
pub async fn handle_daily_limit(
    State(state): State<AppState>,
    Path(learner_id): Path<Uuid>,
) -> Result<Json<DailyLimitReport>, AppError> {
    let report = daily_limit_report(
        state.store.as_ref(),
        learner_id,
        state.config.scheduler.free_daily_limit,
        Utc::now(),
    )
    .await?;
    Ok(Json(report))
}
