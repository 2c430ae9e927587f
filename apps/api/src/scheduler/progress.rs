//! ProgressTracker: applies one challenge outcome to a live batch.
//!
//! Correct answers complete the word; incorrect ones send it to the back of
//! the queue. Once every initial word is completed the batch graduates: the
//! completed states are persisted as `learned` and a pool refill is fired.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::challenge::types::ChallengeOutcome;
use crate::errors::AppError;
use crate::models::learner_word::WordStatus;
use crate::scheduler::batch::{BatchItem, SessionBatch};
use crate::scheduler::maintenance::MaintenanceSink;
use crate::scheduler::store::WordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeDecision {
    Advance,
    Recycle,
    Graduate,
}

#[derive(Clone)]
pub struct ProgressTracker {
    store: Arc<dyn WordStore>,
    maintenance: Arc<dyn MaintenanceSink>,
}

impl ProgressTracker {
    pub fn new(store: Arc<dyn WordStore>, maintenance: Arc<dyn MaintenanceSink>) -> Self {
        Self { store, maintenance }
    }

    pub async fn record_outcome(
        &self,
        batch: &mut SessionBatch,
        word_ref: Uuid,
        outcome: &ChallengeOutcome,
    ) -> Result<OutcomeDecision, AppError> {
        if batch.is_finished() {
            return Err(AppError::Conflict(
                "session batch is already finished".to_string(),
            ));
        }
        let current = batch.current().map(BatchItem::word_id);
        if current != Some(word_ref) || outcome.word_id != word_ref {
            return Err(AppError::Validation(format!(
                "outcome for word {word_ref} does not match the current word"
            )));
        }

        if !outcome.correct {
            batch.recycle_current();
            debug!(learner_id = %batch.learner_id(), %word_ref, queue = batch.len(), "word recycled");
            return Ok(OutcomeDecision::Recycle);
        }

        batch.complete_current();
        if batch.completed_count() < batch.target_size() {
            batch.advance();
            return Ok(OutcomeDecision::Advance);
        }

        // The cursor stays put until the write lands so the last answer can be re-sent.
        let state_ids = batch.completed_state_ids();
        let updated = self
            .store
            .update_status(&state_ids, WordStatus::Learned, Utc::now())
            .await?;

        batch.advance();
        batch.mark_finished();
        info!(
            learner_id = %batch.learner_id(),
            learned = updated,
            combo = outcome.combo.unwrap_or(0),
            "session batch graduated"
        );

        if let Some(task) = batch.refill().cloned() {
            self.maintenance.submit(task);
        }
        Ok(OutcomeDecision::Graduate)
    }
}
