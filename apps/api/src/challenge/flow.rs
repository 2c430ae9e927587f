//! One challenge state machine shared by lesson, practice, flashcards and quiz.
//!
//! Study → Challenge → Success | Failure → Study (next word) or Summary.
//! The flow only evaluates and keeps the streak; what happens to the word
//! is the progress tracker's call, fed back through `settle`.

use serde::{Deserialize, Serialize};

use crate::challenge::builder::Challenge;
use crate::challenge::evaluate::evaluate;
use crate::challenge::types::{Answer, ChallengeOutcome};
use crate::errors::AppError;
use crate::scheduler::progress::OutcomeDecision;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Study,
    Challenge,
    Success,
    Failure,
    Summary,
}

/// Streak at which the combo counter starts showing.
const COMBO_THRESHOLD: u32 = 2;

#[derive(Debug, Clone)]
pub struct ChallengeFlow {
    phase: Phase,
    streak: u32,
    best_streak: u32,
    active: Option<Challenge>,
    /// Streak before the last answer, so a failed save can be undone.
    streak_before_answer: u32,
}

impl ChallengeFlow {
    /// Starts in `Summary` right away when there is nothing to study.
    pub fn new(batch_finished: bool) -> Self {
        Self {
            phase: if batch_finished {
                Phase::Summary
            } else {
                Phase::Study
            },
            streak: 0,
            best_streak: 0,
            active: None,
            streak_before_answer: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    #[cfg(test)]
    pub fn active_challenge(&self) -> Option<&Challenge> {
        self.active.as_ref()
    }

    pub fn begin(&mut self, challenge: Challenge) -> Result<&Challenge, AppError> {
        if self.phase != Phase::Study {
            return Err(AppError::Conflict(format!(
                "cannot start a challenge while in {:?}",
                self.phase
            )));
        }
        self.phase = Phase::Challenge;
        Ok(self.active.insert(challenge))
    }

    /// Evaluates the learner's answer and moves to `Success` or `Failure`.
    pub fn answer(&mut self, answer: &Answer) -> Result<ChallengeOutcome, AppError> {
        let challenge = match self.active.as_ref() {
            Some(challenge) if self.phase == Phase::Challenge => challenge,
            _ => {
                return Err(AppError::Conflict(
                    "no challenge is awaiting an answer".to_string(),
                ))
            }
        };
        let word_id = challenge.word_id;
        let challenge_type = challenge.challenge_type;
        let correct = evaluate(challenge, answer);

        self.streak_before_answer = self.streak;
        if correct {
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
            self.phase = Phase::Success;
        } else {
            self.streak = 0;
            self.phase = Phase::Failure;
        }

        Ok(ChallengeOutcome {
            word_id,
            challenge_type,
            correct,
            combo: (self.streak >= COMBO_THRESHOLD).then_some(self.streak),
        })
    }

    /// Puts the flow back into `Challenge` after the outcome could not be recorded.
    pub fn revert_answer(&mut self) {
        if matches!(self.phase, Phase::Success | Phase::Failure) {
            self.streak = self.streak_before_answer;
            self.phase = Phase::Challenge;
        }
    }

    /// Applies the tracker's decision: next word, or the summary screen.
    pub fn settle(&mut self, decision: OutcomeDecision) {
        self.active = None;
        self.phase = match decision {
            OutcomeDecision::Graduate => Phase::Summary,
            OutcomeDecision::Advance | OutcomeDecision::Recycle => Phase::Study,
        };
    }
}
