use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LearnerProfile {
    pub user_id: Uuid,
    pub english_level: Option<String>,
    pub interest_topics: Vec<String>,
}

impl LearnerProfile {
    /// Level tag used when a session start does not name one.
    pub fn level_or_default(&self) -> &str {
        self.english_level.as_deref().unwrap_or("beginner")
    }

    /// Interests joined into the comma-separated category tag.
    pub fn category_tag(&self) -> String {
        self.interest_topics.join(",")
    }
}

/// Subscription data as written by the payment webhooks.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub user_id: Uuid,
    pub status: String,
    pub current_period_end: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn is_premium_at(&self, now: DateTime<Utc>) -> bool {
        self.status == "active" && self.current_period_end.is_some_and(|end| end > now)
    }
}
