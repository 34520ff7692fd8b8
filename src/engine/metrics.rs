use serde::{Deserialize, Serialize};

pub const AVERAGE_WORD_LENGTH: f64 = 5.0;
const LIVE_WPM_WARMUP_MS: f64 = 100.0;

pub(crate) fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn char_len(word: &str) -> usize {
    word.chars().count()
}

/// Net WPM over exactly-correct words.
///
/// Each correct word contributes its length plus the space that follows it,
/// except the last target word.
pub fn calculate_wpm(target_words: &[String], typed_words: &[String], duration_seconds: f64) -> u32 {
    if duration_seconds <= 0.0 {
        return 0;
    }

    let last = target_words.len().saturating_sub(1);
    let correct_chars: usize = target_words
        .iter()
        .enumerate()
        .filter(|(i, target)| typed_words.get(*i) == Some(*target))
        .map(|(i, target)| char_len(target) + usize::from(i < last))
        .sum();

    let words = correct_chars as f64 / AVERAGE_WORD_LENGTH;
    let minutes = duration_seconds / 60.0;
    (words / minutes).round() as u32
}

/// How accuracy is scored for a test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccuracyMode {
    Normal,
    /// Wrong keystrokes are blocked at entry, so accuracy is reported as an
    /// error rate over the characters typed.
    Strict { errors: usize },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccuracyResult {
    pub accuracy: f64,
    pub per_character_accuracy: f64,
    pub correct_count: usize,
    pub incorrect_count: usize,
    pub total_typed: usize,
}

pub fn calculate_accuracy(target_words: &[String], typed_words: &[String], mode: AccuracyMode) -> AccuracyResult {
    let mut correct_count = 0;
    let mut incorrect_count = 0;
    let mut correct_chars = 0usize;
    let mut total_chars = 0usize;

    for (i, target) in target_words.iter().enumerate() {
        let typed = typed_words.get(i).map(String::as_str).unwrap_or("");
        if typed.is_empty() {
            continue;
        }
        if typed == target {
            correct_count += 1;
        } else {
            incorrect_count += 1;
        }

        let target_chars: Vec<char> = target.chars().collect();
        let typed_chars: Vec<char> = typed.chars().collect();
        let positions = target_chars.len().max(typed_chars.len());
        total_chars += positions;
        correct_chars += (0..positions)
            .filter(|&j| matches!((target_chars.get(j), typed_chars.get(j)), (Some(a), Some(b)) if a == b))
            .count();
    }

    let total_typed = correct_count + incorrect_count;

    let (accuracy, per_character_accuracy) = match mode {
        AccuracyMode::Normal => {
            let word = if total_typed > 0 {
                correct_count as f64 / total_typed as f64 * 100.0
            } else {
                0.0
            };
            let per_char = if total_chars > 0 {
                correct_chars as f64 / total_chars as f64 * 100.0
            } else {
                0.0
            };
            (word, per_char)
        }
        AccuracyMode::Strict { errors } => {
            let typed_chars: usize = typed_words.iter().take(total_typed).map(|w| char_len(w)).sum();
            let error_rate = if typed_chars > 0 {
                errors as f64 / typed_chars as f64 * 100.0
            } else {
                0.0
            };
            (error_rate, error_rate)
        }
    };

    AccuracyResult {
        accuracy: round_to_tenth(accuracy),
        per_character_accuracy: round_to_tenth(per_character_accuracy),
        correct_count,
        incorrect_count,
        total_typed,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharStatus {
    Pending,
    Correct,
    Incorrect,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterComparison {
    pub ch: char,
    pub status: CharStatus,
}

/// Per-character comparison of one word, one entry per target character.
/// Characters typed past the end of the target are not represented.
pub fn compare_words(target: &str, typed: &str) -> Vec<CharacterComparison> {
    let typed: Vec<char> = typed.chars().collect();
    target
        .chars()
        .enumerate()
        .map(|(i, expected)| match typed.get(i) {
            None => CharacterComparison {
                ch: expected,
                status: CharStatus::Pending,
            },
            Some(&actual) if actual == expected => CharacterComparison {
                ch: actual,
                status: CharStatus::Correct,
            },
            Some(&actual) => CharacterComparison {
                ch: actual,
                status: CharStatus::Incorrect,
            },
        })
        .collect()
}

/// Unrounded WPM for a test still in progress.
pub fn calculate_live_wpm(
    target_words: &[String],
    completed_words: &[String],
    current_input: &str,
    current_word_index: usize,
    start_time_ms: f64,
    now_ms: f64,
) -> f64 {
    let elapsed_ms = now_ms - start_time_ms;
    if elapsed_ms < LIVE_WPM_WARMUP_MS {
        return 0.0;
    }

    let completed: usize = target_words
        .iter()
        .zip(completed_words)
        .take(current_word_index)
        .filter(|(target, typed)| target == typed)
        .map(|(target, _)| char_len(target) + 1)
        .sum();

    let in_progress = target_words
        .get(current_word_index)
        .map(|target| {
            target
                .chars()
                .zip(current_input.chars())
                .filter(|(expected, actual)| expected == actual)
                .count()
        })
        .unwrap_or(0);

    let minutes = elapsed_ms / 60_000.0;
    let wpm = (completed + in_progress) as f64 / AVERAGE_WORD_LENGTH / minutes;
    wpm.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(ws: &[&str]) -> Vec<String> {
        ws.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn wpm_counts_correct_words_with_spaces() {
        // "cat dog" = 7 chars = 1.4 words over one minute
        assert_eq!(calculate_wpm(&words(&["cat", "dog"]), &words(&["cat", "dog"]), 60.0), 1);
    }

    #[test]
    fn wpm_zero_for_non_positive_duration() {
        let w = words(&["hello"]);
        assert_eq!(calculate_wpm(&w, &w, 0.0), 0);
        assert_eq!(calculate_wpm(&w, &w, -3.0), 0);
    }

    #[test]
    fn wpm_counts_correct_words_after_mistakes() {
        let target = words(&["alpha", "beta", "gamma", "delta"]);
        let typed = words(&["alpah", "beta", "gama", "delta"]);
        // beta + space (5) and delta without trailing space (5) = 10 chars = 2 words in 30s
        assert_eq!(calculate_wpm(&target, &typed, 30.0), 4);
    }

    #[test]
    fn wpm_never_decreases_when_a_word_is_fixed() {
        let target = words(&["one", "two", "three", "four"]);
        let mut typed = words(&["one", "twp", "thre", "four"]);
        let mut previous = calculate_wpm(&target, &typed, 12.0);
        for i in 0..target.len() {
            typed[i] = target[i].clone();
            let current = calculate_wpm(&target, &typed, 12.0);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn accuracy_scenario_one_of_two() {
        let result = calculate_accuracy(&words(&["cat", "dog"]), &words(&["cat", "dot"]), AccuracyMode::Normal);
        assert_eq!(result.correct_count, 1);
        assert_eq!(result.incorrect_count, 1);
        assert_eq!(result.total_typed, 2);
        assert_eq!(result.accuracy, 50.0);
        // 5 of 6 character positions match
        assert_eq!(result.per_character_accuracy, 83.3);
    }

    #[test]
    fn accuracy_skips_untyped_words() {
        let result = calculate_accuracy(
            &words(&["cat", "dog", "owl"]),
            &words(&["cat", ""]),
            AccuracyMode::Normal,
        );
        assert_eq!(result.total_typed, 1);
        assert_eq!(result.accuracy, 100.0);
        assert_eq!(result.per_character_accuracy, 100.0);
    }

    #[test]
    fn accuracy_pads_shorter_side_as_mismatch() {
        let result = calculate_accuracy(&words(&["cat"]), &words(&["cats"]), AccuracyMode::Normal);
        assert_eq!(result.per_character_accuracy, 75.0);
        let result = calculate_accuracy(&words(&["cats"]), &words(&["ca"]), AccuracyMode::Normal);
        assert_eq!(result.per_character_accuracy, 50.0);
    }

    #[test]
    fn accuracy_zero_when_nothing_typed() {
        let result = calculate_accuracy(&words(&["cat"]), &[], AccuracyMode::Normal);
        assert_eq!(result.accuracy, 0.0);
        assert_eq!(result.per_character_accuracy, 0.0);
        assert_eq!(result.total_typed, 0);
    }

    #[test]
    fn accuracy_stays_within_bounds() {
        let cases = [
            (words(&["a", "bb", "ccc"]), words(&["x", "bbbbbb", ""])),
            (words(&["hello", "world"]), words(&["hello", "world"])),
            (words(&["q"]), words(&["wwwwwwww"])),
        ];
        for (target, typed) in &cases {
            let r = calculate_accuracy(target, typed, AccuracyMode::Normal);
            assert!((0.0..=100.0).contains(&r.accuracy));
            assert!((0.0..=100.0).contains(&r.per_character_accuracy));
        }
    }

    #[test]
    fn strict_mode_reports_error_rate_for_both_fields() {
        let target = words(&["quick", "brown", "fox"]);
        let typed = words(&["quick", "brown", ""]);
        let r = calculate_accuracy(&target, &typed, AccuracyMode::Strict { errors: 1 });
        // 1 error over 10 typed characters
        assert_eq!(r.accuracy, 10.0);
        assert_eq!(r.per_character_accuracy, 10.0);
        assert_eq!(r.total_typed, 2);
        assert_eq!(r.correct_count, 2);
    }

    #[test]
    fn strict_mode_with_nothing_typed_is_zero() {
        let r = calculate_accuracy(&words(&["abc"]), &[], AccuracyMode::Strict { errors: 4 });
        assert_eq!(r.accuracy, 0.0);
    }

    #[test]
    fn compare_words_marks_incorrect_with_typed_char() {
        let cmp = compare_words("cat", "cot");
        assert_eq!(
            cmp,
            vec![
                CharacterComparison { ch: 'c', status: CharStatus::Correct },
                CharacterComparison { ch: 'o', status: CharStatus::Incorrect },
                CharacterComparison { ch: 't', status: CharStatus::Correct },
            ]
        );
    }

    #[test]
    fn compare_words_exact_match_is_all_correct() {
        let cmp = compare_words("rustacean", "rustacean");
        assert!(cmp.iter().all(|c| c.status == CharStatus::Correct));
        let chars: String = cmp.iter().map(|c| c.ch).collect();
        assert_eq!(chars, "rustacean");
    }

    #[test]
    fn compare_words_pending_and_overtyped() {
        let cmp = compare_words("dog", "d");
        assert_eq!(cmp.len(), 3);
        assert_eq!(cmp[1], CharacterComparison { ch: 'o', status: CharStatus::Pending });
        assert_eq!(compare_words("dog", "doggo").len(), 3);
    }

    #[test]
    fn live_wpm_is_zero_during_warmup() {
        let target = words(&["hi"]);
        assert_eq!(calculate_live_wpm(&target, &[], "h", 0, 1_000.0, 1_099.0), 0.0);
    }

    #[test]
    fn live_wpm_counts_completed_and_current_word() {
        let target = words(&["the", "quick", "brown"]);
        let completed = words(&["the", "quikc"]);
        // "the " = 4 chars, "quikc" is wrong, current "brx" matches 2 chars
        let wpm = calculate_live_wpm(&target, &completed, "brx", 2, 0.0, 6_000.0);
        // 6 chars / 5 = 1.2 words over 0.1 minutes
        assert!((wpm - 12.0).abs() < 1e-9);
    }

    #[test]
    fn live_wpm_ignores_input_past_target_word() {
        let target = words(&["go"]);
        let wpm = calculate_live_wpm(&target, &[], "gooooo", 0, 0.0, 60_000.0);
        assert!((wpm - 0.4).abs() < 1e-9);
    }
}
