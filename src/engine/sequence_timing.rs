use serde::{Deserialize, Serialize};

use crate::engine::tally::Tally;
use crate::session::input::KeystrokeEvent;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SequenceTiming {
    pub sequence: String,
    /// Mean first-to-last latency across occurrences, in whole milliseconds.
    pub average_time: u64,
    pub occurrences: usize,
}

/// Average latency of every `sequence_length`-key window, slowest first.
///
/// Only character entries take part; backspace and named keys are dropped
/// before windowing, while space is kept. Each window's sample is the time
/// between its first and last keystroke.
pub fn calculate_sequence_timings(
    keystrokes: &[KeystrokeEvent],
    _target_words: &[String],
    sequence_length: usize,
    top_n: usize,
) -> Vec<SequenceTiming> {
    if sequence_length == 0 {
        return Vec::new();
    }

    let filtered: Vec<&KeystrokeEvent> = keystrokes.iter().filter(|k| k.is_sequence_char()).collect();
    if filtered.len() < sequence_length {
        return Vec::new();
    }

    let mut samples: Tally<String, (f64, usize)> = Tally::default();
    for window in filtered.windows(sequence_length) {
        let sequence: String = window.iter().filter_map(|k| k.key.as_char()).collect();
        let (total, count) = samples.slot(sequence);
        *total += window[sequence_length - 1].timestamp - window[0].timestamp;
        *count += 1;
    }

    let mut timings: Vec<SequenceTiming> = samples
        .into_entries()
        .into_iter()
        .map(|(sequence, (total, occurrences))| SequenceTiming {
            sequence,
            average_time: (total / occurrences as f64).round().max(0.0) as u64,
            occurrences,
        })
        .collect();

    timings.sort_by(|a, b| b.average_time.cmp(&a.average_time));
    timings.truncate(top_n);
    timings
}
