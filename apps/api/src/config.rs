use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub port: u16,
    pub rust_log: String,
    /// Live sessions idle longer than this are dropped from memory.
    pub session_idle_minutes: i64,
    pub scheduler: SchedulerConfig,
}

/// Tunables for pool replenishment, batch sizes and review timing.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    pub min_pool_words: u32,
    pub lesson_size: usize,
    pub practice_size: usize,
    pub deck_size: usize,
    pub review_window_days: i64,
    pub free_daily_limit: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_pool_words: 20,
            lesson_size: 7,
            practice_size: 10,
            deck_size: 20,
            review_window_days: 7,
            free_daily_limit: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = SchedulerConfig::default();
        let scheduler = SchedulerConfig {
            min_pool_words: env_or("MIN_POOL_WORDS", defaults.min_pool_words)?,
            lesson_size: env_or("LESSON_SIZE", defaults.lesson_size)?,
            practice_size: env_or("PRACTICE_SIZE", defaults.practice_size)?,
            deck_size: env_or("DECK_SIZE", defaults.deck_size)?,
            review_window_days: env_or("REVIEW_WINDOW_DAYS", defaults.review_window_days)?,
            free_daily_limit: env_or("FREE_DAILY_LIMIT", defaults.free_daily_limit)?,
        };
        anyhow::ensure!(
            scheduler.min_pool_words > 0,
            "MIN_POOL_WORDS must be a positive integer"
        );

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 10)?,
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            session_idle_minutes: env_or("SESSION_IDLE_MINUTES", 120)?,
            scheduler,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
