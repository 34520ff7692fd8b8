use serde::{Deserialize, Serialize};

use crate::engine::metrics::round_to_tenth;
use crate::engine::trend::{Trend, classify_higher_better};
use crate::session::result::TestResult;

const WPM_TREND_THRESHOLD_PCT: f64 = 10.0;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    pub total_tests: usize,
    pub total_duration_secs: f64,
    pub total_words_typed: usize,
    pub average_wpm: f64,
    pub best_wpm: u32,
    /// Normal-mode tests only; strict tests store an error rate instead.
    pub average_accuracy: f64,
    pub wpm_trend: Trend,
}

/// Totals and averages over active results, newest first.
pub fn summarize_history(results: &[TestResult], recent_window: usize) -> HistorySummary {
    let active: Vec<&TestResult> = results.iter().filter(|r| r.is_active()).collect();
    if active.is_empty() {
        return HistorySummary::default();
    }

    let total_tests = active.len();
    let wpm_sum: f64 = active.iter().map(|r| r.wpm as f64).sum();
    let average_wpm = wpm_sum / total_tests as f64;

    let scored: Vec<f64> = active.iter().filter(|r| !r.is_error_rate()).map(|r| r.accuracy).collect();
    let average_accuracy = if scored.is_empty() {
        0.0
    } else {
        scored.iter().sum::<f64>() / scored.len() as f64
    };

    let recent: Vec<f64> = active.iter().take(recent_window).map(|r| r.wpm as f64).collect();
    let wpm_trend = if recent.is_empty() || recent.len() == total_tests {
        Trend::Stable
    } else {
        let recent_avg = recent.iter().sum::<f64>() / recent.len() as f64;
        classify_higher_better(recent_avg, average_wpm, WPM_TREND_THRESHOLD_PCT)
    };

    HistorySummary {
        total_tests,
        total_duration_secs: active.iter().map(|r| r.duration).sum(),
        total_words_typed: active.iter().map(|r| r.total_typed_words).sum(),
        average_wpm: round_to_tenth(average_wpm),
        best_wpm: active.iter().map(|r| r.wpm).max().unwrap_or(0),
        average_accuracy: round_to_tenth(average_accuracy),
        wpm_trend,
    }
}
