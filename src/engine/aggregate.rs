//! Folds per-test metrics and mistakes across a user's test history.
//!
//! Every function here expects results ordered newest first and scoped to one
//! user. Recency is positional: the first tests in the slice are the most
//! recent, so callers must pass the same ordering each time.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AnalyticsConfig;
use crate::engine::mistakes::analyze_mistakes_with_limit;
use crate::engine::sequence_timing::calculate_sequence_timings;
use crate::engine::tally::Tally;
use crate::engine::trend::{Trend, classify};
use crate::session::result::TestResult;

/// Keep only results created at or after `since`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateFilter {
    pub since: DateTime<Utc>,
}

impl DateFilter {
    pub fn last_days(days: u32, now: DateTime<Utc>) -> Self {
        Self {
            since: now - Duration::days(i64::from(days)),
        }
    }

    fn admits(&self, result: &TestResult) -> bool {
        result.created_at >= self.since
    }
}

fn select(results: &[TestResult], date_filter: Option<DateFilter>) -> Vec<&TestResult> {
    results
        .iter()
        .filter(|r| r.is_active())
        .filter(|r| date_filter.is_none_or(|f| f.admits(r)))
        .collect()
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 { 0.0 } else { sum / n as f64 }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

// ---------------------------------------------------------------------------
// Sequence timing
// ---------------------------------------------------------------------------

/// The slowest 2- and 3-key sequences across all tests, by weighted mean.
pub fn get_aggregate_slow_sequences(results: &[TestResult], limit: usize, config: &AnalyticsConfig) -> Vec<String> {
    let mut pooled: Tally<String, (f64, usize)> = Tally::default();

    for result in select(results, None) {
        if result.target_words.is_empty() {
            log::debug!("skipping test {} for slow sequences: no target words", result.id);
            continue;
        }
        for length in [2, 3] {
            let timings = calculate_sequence_timings(
                &result.keystroke_timings,
                &result.target_words,
                length,
                config.slow_sequence_pool,
            );
            for timing in timings {
                let (total_time, count) = pooled.slot(timing.sequence);
                *total_time += timing.average_time as f64 * timing.occurrences as f64;
                *count += timing.occurrences;
            }
        }
    }

    let mut ranked: Vec<(String, f64)> = pooled
        .into_entries()
        .into_iter()
        .filter(|(_, (_, count))| *count >= config.min_occurrences)
        .map(|(sequence, (total_time, count))| (sequence, total_time / count as f64))
        .collect();
    ranked.sort_by(|a, b| descending(a.1, b.1));
    ranked.into_iter().take(limit).map(|(sequence, _)| sequence).collect()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateSequence {
    pub sequence: String,
    pub total_occurrences: usize,
    /// Milliseconds, averaged over the most recent tests containing the sequence.
    pub recent_average: u64,
    pub overall_average: u64,
    pub trend: Trend,
}

/// Sequence latencies across the history with a recent-versus-overall trend.
///
/// Each test contributes its per-sequence average once per occurrence, so a
/// sequence seen five times in a test adds five equal samples.
pub fn get_aggregate_sequence_timings(
    results: &[TestResult],
    sequence_length: usize,
    top_n: usize,
    date_filter: Option<DateFilter>,
    config: &AnalyticsConfig,
) -> Vec<AggregateSequence> {
    // Samples as (test index, latency ms); index 0 is the newest test.
    let mut samples: Tally<String, Vec<(usize, f64)>> = Tally::default();

    for (test_index, result) in select(results, date_filter).into_iter().enumerate() {
        let timings = calculate_sequence_timings(
            &result.keystroke_timings,
            &result.target_words,
            sequence_length,
            config.aggregate_timing_pool,
        );
        for timing in timings {
            let slot = samples.slot(timing.sequence);
            slot.extend(std::iter::repeat_n((test_index, timing.average_time as f64), timing.occurrences));
        }
    }

    let mut sequences: Vec<(AggregateSequence, f64)> = samples
        .into_entries()
        .into_iter()
        .filter(|(_, s)| s.len() >= config.min_occurrences)
        .map(|(sequence, s)| {
            let overall = mean(s.iter().map(|(_, t)| *t));

            let recent_tests: BTreeSet<usize> = s
                .iter()
                .map(|(i, _)| *i)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .take(config.recent_window)
                .collect();

            let (recent, trend) = if recent_tests.len() < config.min_recent_tests {
                (overall, Trend::Stable)
            } else {
                let recent = mean(s.iter().filter(|(i, _)| recent_tests.contains(i)).map(|(_, t)| *t));
                (recent, classify(recent, overall, config.timing_trend_threshold_pct))
            };

            let aggregate = AggregateSequence {
                sequence,
                total_occurrences: s.len(),
                recent_average: recent.round() as u64,
                overall_average: overall.round() as u64,
                trend,
            };
            (aggregate, overall)
        })
        .collect();

    sequences.sort_by(|a, b| descending(a.1, b.1));
    sequences.into_iter().take(top_n).map(|(s, _)| s).collect()
}

// ---------------------------------------------------------------------------
// Mistakes
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateSubstitution {
    pub expected: char,
    pub actual: char,
    pub total_count: usize,
    pub recent_count: usize,
    pub trend: Trend,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateMistakeSequence {
    pub sequence: String,
    pub total_count: usize,
    pub recent_count: usize,
    pub mistake_positions: Vec<usize>,
    pub trend: Trend,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateMistakeData {
    pub total_tests_analyzed: usize,
    pub character_substitutions: Vec<AggregateSubstitution>,
    pub mistake_sequences: Vec<AggregateMistakeSequence>,
}

#[derive(Default)]
struct MistakeTally {
    total: usize,
    /// (test index, count in that test)
    hits: Vec<(usize, usize)>,
    positions: BTreeSet<usize>,
}

impl MistakeTally {
    fn record(&mut self, test_index: usize, count: usize) {
        self.total += count;
        self.hits.push((test_index, count));
    }

    fn recent_count(&self, window: usize) -> usize {
        self.hits.iter().filter(|(i, _)| *i < window).map(|(_, c)| c).sum()
    }
}

struct RateTrend<'a> {
    total_tests: usize,
    config: &'a AnalyticsConfig,
}

impl RateTrend<'_> {
    /// Compare the per-test rate inside the recent window with the overall rate.
    fn classify(&self, tally: &MistakeTally) -> (usize, Trend) {
        let recent_tests = self.config.recent_window.min(self.total_tests);
        let recent_count = tally.recent_count(self.config.recent_window);
        if recent_tests < self.config.min_recent_tests {
            return (recent_count, Trend::Stable);
        }
        let overall_rate = tally.total as f64 / self.total_tests as f64;
        let recent_rate = recent_count as f64 / recent_tests as f64;
        (
            recent_count,
            classify(recent_rate, overall_rate, self.config.mistake_trend_threshold_pct),
        )
    }
}

/// Substitution and mistake-sequence patterns across the history.
///
/// Tests without keystrokes or target words are skipped and do not take a
/// slot in the recent window.
pub fn get_aggregate_mistakes(
    results: &[TestResult],
    date_filter: Option<DateFilter>,
    config: &AnalyticsConfig,
) -> AggregateMistakeData {
    let mut substitutions: Tally<(char, char), MistakeTally> = Tally::default();
    let mut sequences: Tally<String, MistakeTally> = Tally::default();
    let mut total_tests = 0;

    for result in select(results, date_filter) {
        if result.keystroke_timings.is_empty() || result.target_words.is_empty() {
            log::debug!("skipping test {} for mistakes: missing keystrokes or words", result.id);
            continue;
        }
        let test_index = total_tests;
        total_tests += 1;

        let analysis = analyze_mistakes_with_limit(
            &result.keystroke_timings,
            &result.target_words,
            &result.typed_words,
            config.top_mistakes,
        );
        for sub in analysis.character_substitutions {
            substitutions.slot((sub.expected, sub.actual)).record(test_index, sub.count);
        }
        for seq in analysis.mistake_sequences {
            let tally = sequences.slot(seq.sequence);
            tally.record(test_index, seq.frequency);
            tally.positions.extend(seq.mistake_positions);
        }
    }

    if total_tests == 0 {
        return AggregateMistakeData::default();
    }

    let rate = RateTrend { total_tests, config };

    let mut character_substitutions: Vec<AggregateSubstitution> = substitutions
        .into_entries()
        .into_iter()
        .map(|((expected, actual), tally)| {
            let (recent_count, trend) = rate.classify(&tally);
            AggregateSubstitution {
                expected,
                actual,
                total_count: tally.total,
                recent_count,
                trend,
            }
        })
        .collect();
    character_substitutions.sort_by(|a, b| b.total_count.cmp(&a.total_count));
    character_substitutions.truncate(config.top_mistakes);

    let mut mistake_sequences: Vec<AggregateMistakeSequence> = sequences
        .into_entries()
        .into_iter()
        .map(|(sequence, tally)| {
            let (recent_count, trend) = rate.classify(&tally);
            AggregateMistakeSequence {
                sequence,
                total_count: tally.total,
                recent_count,
                mistake_positions: tally.positions.into_iter().collect(),
                trend,
            }
        })
        .collect();
    mistake_sequences.sort_by(|a, b| b.total_count.cmp(&a.total_count));
    mistake_sequences.truncate(config.top_mistakes);

    AggregateMistakeData {
        total_tests_analyzed: total_tests,
        character_substitutions,
        mistake_sequences,
    }
}

// ---------------------------------------------------------------------------
// Problematic words
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblematicWord {
    pub word: String,
    pub count: usize,
}

/// Target words mistyped at least `min_count` times across the history.
pub fn get_problematic_words(results: &[TestResult], min_count: usize) -> Vec<ProblematicWord> {
    let mut counts: Tally<String, usize> = Tally::default();
    for result in select(results, None) {
        for (target, typed) in result.target_words.iter().zip(&result.typed_words) {
            if !target.is_empty() && !typed.is_empty() && target != typed {
                counts.add(target.clone(), 1);
            }
        }
    }
    counts
        .into_ranked()
        .into_iter()
        .filter(|(_, count)| *count >= min_count)
        .map(|(word, count)| ProblematicWord { word, count })
        .collect()
}
