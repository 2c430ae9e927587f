use crate::challenge::builder::{Challenge, Expected, FALSE_LABEL, TRUE_LABEL};
use crate::challenge::types::Answer;

/// Single evaluation entry point for every challenge type.
pub fn evaluate(challenge: &Challenge, answer: &Answer) -> bool {
    match (&challenge.expected, answer) {
        (Expected::Translation(want), Answer::Text(got))
        | (Expected::SourceWord(want), Answer::Text(got)) => got.trim() == want.trim(),
        (Expected::Letters(want), Answer::Text(got)) => squash(got) == squash(want),
        (Expected::Truth(truth), Answer::Verdict(verdict)) => verdict == truth,
        (Expected::Truth(truth), Answer::Text(label)) => match label.trim() {
            TRUE_LABEL | "true" => *truth,
            FALSE_LABEL | "false" => !*truth,
            _ => false,
        },
        (Expected::Spoken(target), Answer::Text(spoken)) => fuzzy_match(spoken, target),
        _ => false,
    }
}

/// Uppercased letters with every space tile removed.
fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Tolerant comparison of a speech transcript against the target word.
pub fn fuzzy_match(spoken: &str, target: &str) -> bool {
    let spoken = normalize(spoken);
    let target = normalize(target);

    if spoken.is_empty() {
        return false;
    }
    if spoken == target || spoken.contains(&target) {
        return true;
    }

    let spoken_len = spoken.chars().count();
    let target_len = target.chars().count();
    if target.contains(&spoken) && spoken_len as f64 >= target_len as f64 * 0.7 {
        return true;
    }

    let max_distance = std::cmp::max(1, target_len / 5);
    levenshtein(&spoken, &target) <= max_distance
}

/// Lowercase, drop punctuation, collapse whitespace.
fn normalize(s: &str) -> String {
    let cleaned: String = s
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut row = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            row[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(row[j] + 1);
        }
        std::mem::swap(&mut prev, &mut row);
    }
    prev[b.len()]
}
