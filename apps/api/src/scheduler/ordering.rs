//! The batch ordering policy as a plain sort key, so it can be tested without
//! a store.
//!
//! Key: (status rank, priority descending, created_at ascending, state id).
//! `queued` words are resumed attempts and always come before fresh `new`
//! introductions; the state id only breaks exact timestamp ties.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::learner_word::WordStatus;
use crate::scheduler::batch::BatchItem;
use crate::scheduler::selector::ReviewMode;

pub type SchedulingKey = (u8, Reverse<i32>, DateTime<Utc>, Uuid);

pub fn status_rank(status: WordStatus, mode: ReviewMode) -> u8 {
    match (status, mode) {
        (WordStatus::Queued, _) => 0,
        (WordStatus::New, _) => 1,
        // Mixed practice pools treat due reviews like fresh words.
        (WordStatus::Learned, ReviewMode::Interleave) => 1,
        (WordStatus::Learned, _) => 2,
    }
}

pub fn scheduling_key(item: &BatchItem, mode: ReviewMode) -> SchedulingKey {
    (
        status_rank(item.state.status, mode),
        Reverse(item.entry.priority),
        item.state.created_at,
        item.state.id,
    )
}
