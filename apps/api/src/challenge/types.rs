use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChallengeType {
    MultipleChoice,
    FlashReaction,
    ContextCompletion,
    WordAssembly,
    TrueFalse,
    ListeningMatch,
    SpeechChallenge,
}

impl ChallengeType {
    pub const ALL: [ChallengeType; 7] = [
        ChallengeType::MultipleChoice,
        ChallengeType::FlashReaction,
        ChallengeType::ContextCompletion,
        ChallengeType::WordAssembly,
        ChallengeType::TrueFalse,
        ChallengeType::ListeningMatch,
        ChallengeType::SpeechChallenge,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeType::MultipleChoice => "multiple-choice",
            ChallengeType::FlashReaction => "flash-reaction",
            ChallengeType::ContextCompletion => "context-completion",
            ChallengeType::WordAssembly => "word-assembly",
            ChallengeType::TrueFalse => "true-false",
            ChallengeType::ListeningMatch => "listening-match",
            ChallengeType::SpeechChallenge => "speech-challenge",
        }
    }
}

impl fmt::Display for ChallengeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Either one challenge type for the whole session, or a random pick per word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", content = "type", rename_all = "snake_case")]
pub enum ChallengeMode {
    Fixed(ChallengeType),
    #[default]
    Mix,
}

/// What the learner submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    /// A chosen option, the assembled letters, or a speech transcript.
    Text(String),
    /// True/false verdict.
    Verdict(bool),
}

/// Result of one presented challenge, handed to the progress tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChallengeOutcome {
    /// Vocabulary entry id of the word that was challenged.
    pub word_id: Uuid,
    pub challenge_type: ChallengeType,
    pub correct: bool,
    /// Current streak, set once it reaches 2.
    pub combo: Option<u32>,
}
