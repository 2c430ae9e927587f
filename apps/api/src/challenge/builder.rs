//! Builds the presentable challenge for one word: picks the type, draws
//! distractors and keeps the expected answer server-side.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::challenge::types::{ChallengeMode, ChallengeType};
use crate::models::vocabulary::VocabularyEntry;

pub const TRUE_LABEL: &str = "נכון";
pub const FALSE_LABEL: &str = "לא נכון";

/// Shown when there is no distractor to offer.
const PLACEHOLDER: &str = "...";
const BLANK: &str = "_______";

/// What a correct answer looks like. Never sent to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expected {
    Translation(String),
    SourceWord(String),
    Letters(String),
    Truth(bool),
    Spoken(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Challenge {
    pub word_id: Uuid,
    pub challenge_type: ChallengeType,
    /// Text shown to the learner. For listening-match it is spoken, not shown.
    pub prompt: String,
    pub options: Vec<String>,
    /// Shuffled upper-case letters for word-assembly.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub letters: Vec<char>,
    /// Translation of the blanked sentence, for context-completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip)]
    pub(crate) expected: Expected,
}

/// Picks the challenge type for `entry`.
///
/// `Mix` draws uniformly from the types the word and client can support.
/// A fixed context-completion on a word without an example sentence falls
/// back to multiple-choice.
pub fn select_type<R: Rng + ?Sized>(
    mode: ChallengeMode,
    entry: &VocabularyEntry,
    speech_supported: bool,
    rng: &mut R,
) -> ChallengeType {
    match mode {
        ChallengeMode::Fixed(ChallengeType::ContextCompletion) if !entry.has_example() => {
            ChallengeType::MultipleChoice
        }
        ChallengeMode::Fixed(ty) => ty,
        ChallengeMode::Mix => {
            let eligible: Vec<ChallengeType> = ChallengeType::ALL
                .into_iter()
                .filter(|ty| match ty {
                    ChallengeType::SpeechChallenge => speech_supported,
                    ChallengeType::ContextCompletion => entry.has_example(),
                    _ => true,
                })
                .collect();
            eligible[rng.random_range(0..eligible.len())]
        }
    }
}

pub fn build_challenge<R: Rng + ?Sized>(
    entry: &VocabularyEntry,
    challenge_type: ChallengeType,
    others: &[VocabularyEntry],
    rng: &mut R,
) -> Challenge {
    let mut challenge = Challenge {
        word_id: entry.id,
        challenge_type,
        prompt: entry.english_word.clone(),
        options: Vec::new(),
        letters: Vec::new(),
        hint: None,
        expected: Expected::SourceWord(entry.english_word.clone()),
    };

    match challenge_type {
        ChallengeType::MultipleChoice | ChallengeType::ListeningMatch => {
            let correct = entry.hebrew_translation.clone();
            let mut options = distractors(entry, others, |e| &e.hebrew_translation, 3, rng);
            options.push(correct.clone());
            options.shuffle(rng);
            challenge.options = options;
            challenge.expected = Expected::Translation(correct);
        }
        ChallengeType::FlashReaction => {
            let mut options = distractors(entry, others, |e| &e.english_word, 1, rng);
            if options.is_empty() {
                options.push(PLACEHOLDER.to_string());
            }
            options.push(entry.english_word.clone());
            options.shuffle(rng);
            challenge.prompt = entry.hebrew_translation.clone();
            challenge.options = options;
        }
        ChallengeType::ContextCompletion => {
            let mut options = distractors(entry, others, |e| &e.english_word, 2, rng);
            options.push(entry.english_word.clone());
            options.shuffle(rng);
            if let Some((sentence, translation)) = entry.example_parts() {
                challenge.prompt = blank_out(sentence, &entry.english_word);
                challenge.hint = translation.map(str::to_string);
            }
            challenge.options = options;
        }
        ChallengeType::WordAssembly => {
            let target = entry.english_word.to_uppercase();
            let mut letters: Vec<char> = target.chars().collect();
            letters.shuffle(rng);
            challenge.letters = letters;
            challenge.expected = Expected::Letters(target);
        }
        ChallengeType::TrueFalse => {
            let wrong = distractors(entry, others, |e| &e.hebrew_translation, 1, rng)
                .pop()
                .unwrap_or_else(|| PLACEHOLDER.to_string());
            let is_true = rng.random_bool(0.5);
            let shown = if is_true {
                entry.hebrew_translation.as_str()
            } else {
                wrong.as_str()
            };
            challenge.prompt = format!("{} = {}", entry.english_word, shown);
            challenge.options = vec![TRUE_LABEL.to_string(), FALSE_LABEL.to_string()];
            challenge.expected = Expected::Truth(is_true);
        }
        ChallengeType::SpeechChallenge => {
            challenge.expected = Expected::Spoken(entry.english_word.clone());
        }
    }

    challenge
}

/// Up to `count` random texts from other words. Each text appears once and
/// none equals the word's own text.
fn distractors<R, F>(
    entry: &VocabularyEntry,
    others: &[VocabularyEntry],
    text: F,
    count: usize,
    rng: &mut R,
) -> Vec<String>
where
    R: Rng + ?Sized,
    F: Fn(&VocabularyEntry) -> &String,
{
    let own = text(entry);
    let mut seen: HashSet<&str> = HashSet::new();
    seen.insert(own.as_str());
    let mut pool: Vec<String> = others
        .iter()
        .filter(|other| other.id != entry.id)
        .map(&text)
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect();
    pool.shuffle(rng);
    pool.truncate(count);
    pool
}

/// Replaces every whole-word occurrence of `word` in `sentence` with a blank,
/// ignoring ASCII case.
pub fn blank_out(sentence: &str, word: &str) -> String {
    let needle = word.trim().to_ascii_lowercase();
    if needle.is_empty() {
        return sentence.to_string();
    }
    let haystack = sentence.to_ascii_lowercase();
    let is_word_char = |c: char| c.is_alphanumeric() || c == '\'';

    let mut out = String::with_capacity(sentence.len());
    let mut last = 0;
    let mut search_from = 0;
    while let Some(offset) = haystack[search_from..].find(&needle) {
        let start = search_from + offset;
        let end = start + needle.len();
        let before_ok = sentence[..start].chars().next_back().map_or(true, |c| !is_word_char(c));
        let after_ok = sentence[end..].chars().next().map_or(true, |c| !is_word_char(c));
        if before_ok && after_ok {
            out.push_str(&sentence[last..start]);
            out.push_str(BLANK);
            last = end;
        }
        search_from = end;
    }
    out.push_str(&sentence[last..]);
    out
}
