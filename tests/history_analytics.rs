use chrono::{DateTime, Duration, Utc};
use tempfile::TempDir;

use keypace::config::AnalyticsConfig;
use keypace::engine::DateFilter;
use keypace::engine::Trend;
use keypace::engine::aggregate::{
    ProblematicWord, get_aggregate_mistakes, get_aggregate_sequence_timings,
    get_aggregate_slow_sequences, get_problematic_words,
};
use keypace::engine::summary::summarize_history;
use keypace::session::input::KeystrokeEvent;
use keypace::session::result::{CompletedTest, ContentStyle, TestMode, TestResult, TestStatus};
use keypace::store::json_store::JsonStore;

const USER: &str = "ada";
const GAP_MS: f64 = 150.0;

/// Type "the cat" with every key `GAP_MS` apart except t->h, which takes
/// `th_gap`. With `slip`, the 'e' comes out as an uncorrected 'r'.
fn typed_test(index: usize, now: DateTime<Utc>, th_gap: f64, slip: bool) -> TestResult {
    let target = ["the", "cat"];
    let mut keystrokes = Vec::new();
    let mut typed_words = Vec::new();
    let mut clock = 0.0;

    for (wi, word) in target.iter().enumerate() {
        let mut typed = String::new();
        for (ci, expected) in word.chars().enumerate() {
            if !keystrokes.is_empty() {
                clock += if wi == 0 && ci == 1 { th_gap } else { GAP_MS };
            }
            let actual = if slip && expected == 'e' { 'r' } else { expected };
            keystrokes.push(KeystrokeEvent::typed(clock, actual, expected, wi, ci));
            typed.push(actual);
        }
        if wi == 0 {
            clock += GAP_MS;
            keystrokes.push(KeystrokeEvent::typed(clock, ' ', ' ', wi, word.len()));
        }
        typed_words.push(typed);
    }

    TestResult::from_completed(CompletedTest {
        id: format!("test-{index}"),
        user_id: USER.to_string(),
        created_at: now - Duration::hours(index as i64 * 10),
        duration_secs: 6.0,
        test_content_id: Some("fixed-1".to_string()),
        content_style: ContentStyle::Prose,
        mode: TestMode::Normal,
        target_words: target.iter().map(|w| w.to_string()).collect(),
        typed_words,
        keystrokes,
        strict_mode_errors: 0,
    })
}

/// Six tests, index 0 newest. The three oldest are slow on "th" and slip on 'e'.
fn seeded_store(now: DateTime<Utc>) -> (TempDir, JsonStore) {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
    for index in (0..6).rev() {
        let old = index >= 3;
        let th_gap = if old { 300.0 } else { 100.0 };
        store.append_result(typed_test(index, now, th_gap, old)).unwrap();
    }
    (dir, store)
}

fn short_window() -> AnalyticsConfig {
    AnalyticsConfig {
        recent_window: 3,
        ..AnalyticsConfig::default()
    }
}

fn ids(results: &[TestResult]) -> Vec<&str> {
    results.iter().map(|r| r.id.as_str()).collect()
}

#[test]
fn persisted_history_loads_newest_first() {
    let now = Utc::now();
    let (_dir, store) = seeded_store(now);

    let results = store.active_results(USER);
    assert_eq!(
        ids(&results),
        vec!["test-0", "test-1", "test-2", "test-3", "test-4", "test-5"]
    );
    assert_eq!(results[0].accuracy, 100.0);
    assert_eq!(results[5].accuracy, 50.0);
    assert_eq!(results[5].typed_words, vec!["thr", "cat"]);
    assert!(store.active_results("someone-else").is_empty());
}

#[test]
fn summary_over_loaded_history() {
    let now = Utc::now();
    let (_dir, store) = seeded_store(now);
    let summary = summarize_history(&store.active_results(USER), 10);
    assert_eq!(summary.total_tests, 6);
    assert_eq!(summary.total_duration_secs, 36.0);
    assert_eq!(summary.total_words_typed, 12);
    assert_eq!(summary.average_accuracy, 75.0);
}

#[test]
fn slowest_sequence_is_the_slipped_trigram() {
    let now = Utc::now();
    let (_dir, store) = seeded_store(now);
    let results = store.active_results(USER);

    // "thr" = 300 + 150 in each of three tests; nothing else averages above 300.
    let slow = get_aggregate_slow_sequences(&results, 3, &AnalyticsConfig::default());
    assert_eq!(slow.len(), 3);
    assert_eq!(slow[0], "thr");
}

#[test]
fn th_latency_trend_is_improving() {
    let now = Utc::now();
    let (_dir, store) = seeded_store(now);
    let results = store.active_results(USER);

    let timings = get_aggregate_sequence_timings(&results, 2, 20, None, &short_window());
    let th = timings.iter().find(|s| s.sequence == "th").unwrap();
    assert_eq!(th.total_occurrences, 6);
    assert_eq!(th.overall_average, 200);
    assert_eq!(th.recent_average, 100);
    assert_eq!(th.trend, Trend::Improving);

    // With the default window every test is recent, so nothing moves.
    let timings = get_aggregate_sequence_timings(&results, 2, 20, None, &AnalyticsConfig::default());
    let th = timings.iter().find(|s| s.sequence == "th").unwrap();
    assert_eq!(th.recent_average, th.overall_average);
    assert_eq!(th.trend, Trend::Stable);
}

#[test]
fn mistakes_fade_out_of_recent_window() {
    let now = Utc::now();
    let (_dir, store) = seeded_store(now);
    let results = store.active_results(USER);

    let data = get_aggregate_mistakes(&results, None, &short_window());
    assert_eq!(data.total_tests_analyzed, 6);
    let sub = &data.character_substitutions[0];
    assert_eq!((sub.expected, sub.actual), ('e', 'r'));
    assert_eq!(sub.total_count, 3);
    assert_eq!(sub.recent_count, 0);
    assert_eq!(sub.trend, Trend::Improving);
    assert!(data.mistake_sequences.iter().any(|s| s.sequence == "thr" && s.total_count == 3));

    let words = get_problematic_words(&results, 1);
    assert_eq!(
        words,
        vec![ProblematicWord {
            word: "the".to_string(),
            count: 3
        }]
    );
}

#[test]
fn date_filter_limits_aggregates_to_recent_days() {
    let now = Utc::now();
    let (_dir, store) = seeded_store(now);
    let results = store.active_results(USER);

    // Tests 0..=2 are 0, 10 and 20 hours old; the slips start at 30 hours.
    let filter = DateFilter::last_days(1, now);
    let data = get_aggregate_mistakes(&results, Some(filter), &short_window());
    assert_eq!(data.total_tests_analyzed, 3);
    assert!(data.character_substitutions.is_empty());
}

#[test]
fn soft_deleted_tests_leave_reports() {
    let now = Utc::now();
    let (_dir, store) = seeded_store(now);

    for id in ["test-3", "test-4", "test-5"] {
        assert!(store.set_status(id, TestStatus::Deleted).unwrap());
    }
    let results = store.active_results(USER);
    assert_eq!(ids(&results), vec!["test-0", "test-1", "test-2"]);
    assert!(get_problematic_words(&results, 1).is_empty());
    assert!(
        get_aggregate_mistakes(&results, None, &short_window())
            .character_substitutions
            .is_empty()
    );

    assert!(store.set_status("test-5", TestStatus::Complete).unwrap());
    let results = store.active_results(USER);
    assert_eq!(results.len(), 4);
    assert_eq!(get_problematic_words(&results, 1)[0].count, 1);
}
