use chrono::{DateTime, NaiveTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::scheduler::store::WordStore;

/// How many more words a learner may learn today. Informational only;
/// sessions are never gated on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyLimitReport {
    pub learned_today: i64,
    pub daily_limit: u32,
    /// `None` for premium learners (unlimited).
    pub remaining: Option<i64>,
    pub is_premium: bool,
    pub can_learn_more: bool,
}

pub fn start_of_utc_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

pub fn build_report(learned_today: i64, daily_limit: u32, is_premium: bool) -> DailyLimitReport {
    let limit = i64::from(daily_limit);
    DailyLimitReport {
        learned_today,
        daily_limit,
        remaining: (!is_premium).then(|| (limit - learned_today).max(0)),
        is_premium,
        can_learn_more: is_premium || learned_today < limit,
    }
}

pub async fn daily_limit_report(
    store: &dyn WordStore,
    learner_id: Uuid,
    daily_limit: u32,
    now: DateTime<Utc>,
) -> Result<DailyLimitReport, AppError> {
    let is_premium = store
        .subscription(learner_id)
        .await?
        .is_some_and(|s| s.is_premium_at(now));
    let learned_today = store
        .count_learned_since(learner_id, start_of_utc_day(now))
        .await?;
    Ok(build_report(learned_today, daily_limit, is_premium))
}
