use std::sync::Arc;

use crate::config::Config;
use crate::scheduler::store::WordStore;
use crate::scheduler::Scheduler;
use crate::sessions::registry::SessionRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Postgres in production, the in-memory store in router tests.
    pub store: Arc<dyn WordStore>,
    pub scheduler: Scheduler,
    /// Live session batches, keyed by session id. Not persisted.
    pub sessions: Arc<SessionRegistry>,
    pub config: Config,
}
