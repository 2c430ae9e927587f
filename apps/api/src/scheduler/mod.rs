// Word scheduling core: pool replenishment, batch selection, progress tracking.
// Everything goes through the WordStore traits; no SQL outside pg_store.

pub mod batch;
pub mod levels;
pub mod maintenance;
pub mod ordering;
pub mod pg_store;
pub mod progress;
pub mod replenisher;
pub mod selector;
pub mod store;

#[cfg(test)]
pub(crate) mod memory_store;

use std::num::NonZeroU32;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::errors::AppError;
use crate::scheduler::batch::SessionBatch;
use crate::scheduler::maintenance::{MaintenanceSink, MaintenanceTask};
use crate::scheduler::progress::ProgressTracker;
use crate::scheduler::replenisher::WordPoolReplenisher;
use crate::scheduler::selector::{ReviewPolicy, SessionKind, SessionSelector};
use crate::scheduler::store::WordStore;

/// Wires the three scheduler components together for a session start.
#[derive(Clone)]
pub struct Scheduler {
    replenisher: WordPoolReplenisher,
    selector: SessionSelector,
    tracker: ProgressTracker,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn WordStore>,
        maintenance: Arc<dyn MaintenanceSink>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            replenisher: WordPoolReplenisher::new(store.clone()),
            selector: SessionSelector::new(
                store.clone(),
                ReviewPolicy::from_days(config.review_window_days),
            ),
            tracker: ProgressTracker::new(store, maintenance),
            config,
        }
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Tops up the pool, then builds the batch for `kind`. The batch carries
    /// the refill to fire once it graduates.
    pub async fn start_session(
        &self,
        learner_id: Uuid,
        kind: SessionKind,
        level: &str,
        category: &str,
        min_count: Option<NonZeroU32>,
    ) -> Result<SessionBatch, AppError> {
        let min_count = match min_count {
            Some(n) => n,
            None => NonZeroU32::new(self.config.min_pool_words).ok_or_else(|| {
                AppError::Validation("minimum pool size must be positive".to_string())
            })?,
        };

        self.replenisher
            .ensure_minimum(learner_id, level, category, min_count)
            .await;

        let batch = self
            .selector
            .build_batch(learner_id, kind.batch_size(&self.config), kind.review_mode())
            .await?;
        info!(%learner_id, ?kind, size = batch.target_size(), "session started");

        Ok(batch.with_refill(MaintenanceTask::Replenish {
            learner_id,
            level: level.to_string(),
            category: category.to_string(),
            min_count,
        }))
    }
}
