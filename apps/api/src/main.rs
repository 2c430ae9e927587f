mod challenge;
mod config;
mod db;
mod errors;
mod library;
mod models;
mod routes;
mod scheduler;
mod sessions;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::scheduler::maintenance::SpawningMaintenance;
use crate::scheduler::pg_store::PgWordStore;
use crate::scheduler::replenisher::WordPoolReplenisher;
use crate::scheduler::store::WordStore;
use crate::scheduler::Scheduler;
use crate::sessions::registry::SessionRegistry;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TalkFix API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url, config.db_max_connections).await?;
    let store: Arc<dyn WordStore> = Arc::new(PgWordStore::new(db));

    // Scheduler with detached post-session refills
    let maintenance = Arc::new(SpawningMaintenance::new(WordPoolReplenisher::new(
        store.clone(),
    )));
    let scheduler = Scheduler::new(store.clone(), maintenance, config.scheduler.clone());
    info!(
        "Scheduler config: pool {} / lesson {} / practice {} / deck {} / review after {}d",
        config.scheduler.min_pool_words,
        config.scheduler.lesson_size,
        config.scheduler.practice_size,
        config.scheduler.deck_size,
        config.scheduler.review_window_days
    );

    let sessions = Arc::new(SessionRegistry::new());
    spawn_session_janitor(sessions.clone(), config.session_idle_minutes);

    // Build app state
    let state = AppState {
        store,
        scheduler,
        sessions,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically drops abandoned sessions that were never deleted.
fn spawn_session_janitor(sessions: Arc<SessionRegistry>, idle_minutes: i64) {
    let max_idle = chrono::Duration::minutes(idle_minutes);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(StdDuration::from_secs(60));
        loop {
            ticker.tick().await;
            sessions.purge_idle(max_idle).await;
        }
    });
}
