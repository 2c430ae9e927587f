//! Deferred maintenance fired by the scheduler without blocking the caller.
//!
//! The progress tracker only hands a task to a `MaintenanceSink`; whether it
//! runs on a spawned tokio task or is captured by a test is up to the sink.

use std::num::NonZeroU32;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::scheduler::replenisher::WordPoolReplenisher;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaintenanceTask {
    /// Top the learner's pool back up after a batch graduates.
    Replenish {
        learner_id: Uuid,
        level: String,
        category: String,
        #[serde(serialize_with = "serialize_non_zero")]
        min_count: NonZeroU32,
    },
}

fn serialize_non_zero<S: serde::Serializer>(v: &NonZeroU32, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u32(v.get())
}

/// Fire-and-forget submission. Implementations must not block.
pub trait MaintenanceSink: Send + Sync {
    fn submit(&self, task: MaintenanceTask);
}

/// Production sink: runs every task on its own tokio task.
#[derive(Clone)]
pub struct SpawningMaintenance {
    replenisher: WordPoolReplenisher,
}

impl SpawningMaintenance {
    pub fn new(replenisher: WordPoolReplenisher) -> Self {
        Self { replenisher }
    }

    /// Runs a task to completion. Failures are already logged by the
    /// replenisher and never surface here.
    pub async fn run(&self, task: MaintenanceTask) {
        match task {
            MaintenanceTask::Replenish {
                learner_id,
                level,
                category,
                min_count,
            } => {
                let inserted = self
                    .replenisher
                    .ensure_minimum(learner_id, &level, &category, min_count)
                    .await;
                info!(%learner_id, inserted, "post-batch replenish finished");
            }
        }
    }

    pub fn spawn(&self, task: MaintenanceTask) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.run(task).await })
    }
}

impl MaintenanceSink for SpawningMaintenance {
    fn submit(&self, task: MaintenanceTask) {
        debug!(?task, "maintenance submitted");
        // Detached on purpose; the handle is only awaited in tests.
        drop(self.spawn(task));
    }
}
