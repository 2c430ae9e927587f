//! In-memory registry of live sessions. A session is one batch plus its
//! challenge flow; dropping it discards the batch with no side effects.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::challenge::flow::ChallengeFlow;
use crate::challenge::types::ChallengeMode;
use crate::scheduler::batch::SessionBatch;
use crate::scheduler::selector::SessionKind;

#[derive(Debug)]
pub struct ActiveSession {
    pub id: Uuid,
    pub kind: SessionKind,
    pub mode: ChallengeMode,
    pub speech_supported: bool,
    pub batch: SessionBatch,
    pub flow: ChallengeFlow,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl ActiveSession {
    pub fn new(
        kind: SessionKind,
        mode: ChallengeMode,
        speech_supported: bool,
        batch: SessionBatch,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            mode,
            speech_supported,
            flow: ChallengeFlow::new(batch.is_finished()),
            batch,
            started_at: now,
            last_activity: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

pub type SharedSession = Arc<Mutex<ActiveSession>>;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: ActiveSession) -> SharedSession {
        let id = session.id;
        let shared = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, shared.clone());
        shared
    }

    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.write().await.remove(&id)
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions with no activity for longer than `max_idle`.
    /// Sessions currently locked by a request are left alone.
    pub async fn purge_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| match session.try_lock() {
            Ok(s) => s.last_activity >= cutoff,
            Err(_) => true,
        });
        let purged = before - sessions.len();
        if purged > 0 {
            info!(purged, "purged idle sessions");
        }
        purged
    }
}
