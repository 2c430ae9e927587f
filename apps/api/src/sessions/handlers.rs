use std::num::NonZeroU32;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::challenge::builder::{build_challenge, select_type, Challenge};
use crate::challenge::flow::Phase;
use crate::challenge::types::{Answer, ChallengeMode};
use crate::errors::AppError;
use crate::models::learner_word::WordStatus;
use crate::models::vocabulary::VocabularyEntry;
use crate::scheduler::progress::OutcomeDecision;
use crate::scheduler::selector::SessionKind;
use crate::scheduler::store::WordStore;
use crate::sessions::registry::ActiveSession;
use crate::state::AppState;

/// Catalog words mixed into the batch's own words when drawing distractors.
const DISTRACTOR_SAMPLE: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub learner_id: Uuid,
    pub kind: SessionKind,
    /// Falls back to the learner profile's english level.
    pub level: Option<String>,
    /// Comma-separated interests; falls back to the profile's topics.
    pub category: Option<String>,
    #[serde(default)]
    pub challenge_mode: ChallengeMode,
    #[serde(default)]
    pub speech_supported: bool,
    pub min_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: Answer,
}

#[derive(Debug, Serialize)]
pub struct WordCard {
    pub word_id: Uuid,
    pub english_word: String,
    pub hebrew_translation: String,
    pub category: String,
    pub example_sentence: Option<String>,
    pub pronunciation: Option<String>,
    pub status: WordStatus,
}

#[derive(Debug, Serialize)]
pub struct SessionProgress {
    pub completed: usize,
    /// Vocabulary entry ids in the order they were first answered correctly.
    pub completed_word_ids: Vec<Uuid>,
    pub target: usize,
    pub queue_length: usize,
    pub position: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub learner_id: Uuid,
    pub kind: SessionKind,
    pub phase: Phase,
    pub current: Option<WordCard>,
    pub progress: SessionProgress,
    pub streak: u32,
    pub best_streak: u32,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    pub correct: bool,
    pub combo: Option<u32>,
    pub decision: OutcomeDecision,
    pub session: SessionView,
}

impl SessionView {
    fn of(session: &ActiveSession) -> Self {
        let batch = &session.batch;
        let current = batch.current().map(|item| WordCard {
            word_id: item.word_id(),
            english_word: item.entry.english_word.clone(),
            hebrew_translation: item.entry.hebrew_translation.clone(),
            category: item.entry.category.clone(),
            example_sentence: item.entry.example_sentence.clone(),
            pronunciation: item.entry.pronunciation.clone(),
            status: item.state.status,
        });
        Self {
            session_id: session.id,
            learner_id: batch.learner_id(),
            kind: session.kind,
            phase: session.flow.phase(),
            current,
            progress: SessionProgress {
                completed: batch.completed_count(),
                completed_word_ids: batch.completion_order().to_vec(),
                target: batch.target_size(),
                queue_length: batch.len(),
                position: batch.cursor(),
            },
            streak: session.flow.streak(),
            best_streak: session.flow.best_streak(),
            started_at: session.started_at,
        }
    }
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let min_count = match req.min_count {
        None => None,
        Some(n) => Some(NonZeroU32::new(n).ok_or_else(|| {
            AppError::Validation("min_count must be a positive integer".to_string())
        })?),
    };

    let (level, category) = match (req.level, req.category) {
        (Some(level), Some(category)) => (level, category),
        (level, category) => {
            let profile = state.store.learner_profile(req.learner_id).await?;
            (
                level.unwrap_or_else(|| {
                    profile
                        .as_ref()
                        .map(|p| p.level_or_default().to_string())
                        .unwrap_or_default()
                }),
                category.unwrap_or_else(|| {
                    profile.as_ref().map(|p| p.category_tag()).unwrap_or_default()
                }),
            )
        }
    };

    let batch = state
        .scheduler
        .start_session(req.learner_id, req.kind, &level, &category, min_count)
        .await?;

    let session = ActiveSession::new(req.kind, req.challenge_mode, req.speech_supported, batch);
    note_study(state.store.as_ref(), &session).await;
    let view = SessionView::of(&session);
    state.sessions.insert(session).await;

    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let shared = find_session(&state, id).await?;
    let session = shared.lock().await;
    Ok(Json(SessionView::of(&session)))
}

/// POST /api/v1/sessions/:id/challenge
pub async fn handle_start_challenge(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Challenge>, AppError> {
    let shared = find_session(&state, id).await?;
    let mut session = shared.lock().await;

    if session.flow.phase() != Phase::Study {
        return Err(AppError::Conflict(format!(
            "session {id} is not in the study phase"
        )));
    }
    let Some(current) = session.batch.current().map(|item| item.entry.clone()) else {
        return Err(AppError::Conflict(format!("session {id} has no current word")));
    };

    let mut others: Vec<VocabularyEntry> = session
        .batch
        .items()
        .iter()
        .map(|item| item.entry.clone())
        .collect();
    match state.store.sample_entries(DISTRACTOR_SAMPLE).await {
        Ok(sample) => others.extend(sample),
        Err(e) => warn!(session_id = %id, "distractor sample failed, using batch words only: {e}"),
    }

    let challenge = {
        let mut rng = rand::rng();
        let challenge_type = select_type(session.mode, &current, session.speech_supported, &mut rng);
        build_challenge(&current, challenge_type, &others, &mut rng)
    };
    debug!(session_id = %id, challenge_type = %challenge.challenge_type, "challenge started");

    session.touch();
    let challenge = session.flow.begin(challenge)?.clone();
    Ok(Json(challenge))
}

/// POST /api/v1/sessions/:id/answer
pub async fn handle_answer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let shared = find_session(&state, id).await?;
    let mut guard = shared.lock().await;
    let session = &mut *guard;

    let outcome = session.flow.answer(&req.answer)?;
    let decision = match state
        .scheduler
        .tracker()
        .record_outcome(&mut session.batch, outcome.word_id, &outcome)
        .await
    {
        Ok(decision) => decision,
        Err(e) => {
            session.flow.revert_answer();
            return Err(e);
        }
    };

    session.flow.settle(decision);
    session.touch();
    note_study(state.store.as_ref(), session).await;

    Ok(Json(AnswerResponse {
        correct: outcome.correct,
        combo: outcome.combo,
        decision,
        session: SessionView::of(session),
    }))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_abandon_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .sessions
        .remove(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    debug!(session_id = %id, "session abandoned");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_session(
    state: &AppState,
    id: Uuid,
) -> Result<crate::sessions::registry::SharedSession, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

/// Counts a view for the word now in the study phase. Best effort.
async fn note_study(store: &dyn WordStore, session: &ActiveSession) {
    if session.flow.phase() != Phase::Study {
        return;
    }
    let Some(item) = session.batch.current() else {
        return;
    };
    let learner_id = session.batch.learner_id();
    if let Err(e) = store.record_view(learner_id, item.word_id(), Utc::now()).await {
        warn!(%learner_id, word_id = %item.word_id(), "failed to record word view: {e}");
    }
}
