use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::engine::metrics::round_to_tenth;
use crate::engine::tally::Tally;
use crate::session::input::{Key, KeystrokeEvent};

const TOP_MISTAKES: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSubstitution {
    pub expected: char,
    pub actual: char,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MistypedWord {
    pub expected: String,
    pub typed: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MistakeSequence {
    pub sequence: String,
    pub frequency: usize,
    /// Zero-based in-window positions that were wrong in any occurrence.
    pub mistake_positions: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MistakeAnalysis {
    pub total_mistakes: usize,
    pub total_corrections: usize,
    pub mistake_rate: f64,
    pub character_substitutions: Vec<CharacterSubstitution>,
    pub commonly_mistyped_words: Vec<MistypedWord>,
    pub mistake_sequences: Vec<MistakeSequence>,
}

fn is_boundary_key(key: &Key) -> bool {
    matches!(key, Key::Char(' ') | Key::Tab)
}

pub fn analyze_mistakes(
    keystrokes: &[KeystrokeEvent],
    target_words: &[String],
    typed_words: &[String],
) -> MistakeAnalysis {
    analyze_mistakes_with_limit(keystrokes, target_words, typed_words, TOP_MISTAKES)
}

/// `analyze_mistakes` keeping the top `limit` entries of each list.
pub fn analyze_mistakes_with_limit(
    keystrokes: &[KeystrokeEvent],
    target_words: &[String],
    typed_words: &[String],
    limit: usize,
) -> MistakeAnalysis {
    let mut total_mistakes = 0;
    let mut total_corrections = 0;
    let mut substitutions: Tally<(char, char), usize> = Tally::default();

    for keystroke in keystrokes {
        if keystroke.is_backspace {
            total_corrections += 1;
            continue;
        }
        if keystroke.was_correct || is_boundary_key(&keystroke.key) {
            continue;
        }
        total_mistakes += 1;
        if let Some(actual) = keystroke.key.as_char() {
            substitutions.add((keystroke.expected_char, actual), 1);
        }
    }

    let mut mistyped: Tally<(String, String), usize> = Tally::default();
    for (target, typed) in target_words.iter().zip(typed_words) {
        if !target.is_empty() && !typed.is_empty() && target != typed {
            mistyped.add((target.clone(), typed.clone()), 1);
        }
    }

    let mistake_rate = if keystrokes.is_empty() {
        0.0
    } else {
        round_to_tenth(total_mistakes as f64 / keystrokes.len() as f64 * 100.0)
    };

    let character_substitutions = substitutions
        .into_ranked()
        .into_iter()
        .take(limit)
        .map(|((expected, actual), count)| CharacterSubstitution {
            expected,
            actual,
            count,
        })
        .collect();

    let commonly_mistyped_words = mistyped
        .into_ranked()
        .into_iter()
        .take(limit)
        .map(|((expected, typed), count)| MistypedWord { expected, typed, count })
        .collect();

    let mut mistake_sequences = find_mistake_sequences(keystrokes, 2);
    mistake_sequences.extend(find_mistake_sequences(keystrokes, 3));
    mistake_sequences.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    mistake_sequences.truncate(limit);

    MistakeAnalysis {
        total_mistakes,
        total_corrections,
        mistake_rate,
        character_substitutions,
        commonly_mistyped_words,
        mistake_sequences,
    }
}

/// Every `sequence_length` window of typed characters containing at least one
/// wrong keystroke, grouped by text.
pub(crate) fn find_mistake_sequences(keystrokes: &[KeystrokeEvent], sequence_length: usize) -> Vec<MistakeSequence> {
    if sequence_length == 0 {
        return Vec::new();
    }
    let filtered: Vec<&KeystrokeEvent> = keystrokes.iter().filter(|k| k.is_sequence_char()).collect();

    let mut hits: Tally<String, (usize, BTreeSet<usize>)> = Tally::default();
    for window in filtered.windows(sequence_length) {
        if window.iter().all(|k| k.was_correct) {
            continue;
        }
        let sequence: String = window.iter().filter_map(|k| k.key.as_char()).collect();
        let (frequency, positions) = hits.slot(sequence);
        *frequency += 1;
        positions.extend(window.iter().enumerate().filter(|(_, k)| !k.was_correct).map(|(i, _)| i));
    }

    let mut sequences: Vec<MistakeSequence> = hits
        .into_entries()
        .into_iter()
        .map(|(sequence, (frequency, positions))| MistakeSequence {
            sequence,
            frequency,
            mistake_positions: positions.into_iter().collect(),
        })
        .collect();
    sequences.sort_by(|a, b| b.frequency.cmp(&a.frequency));
    sequences
}
