use std::fs;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use keypace::session::input::KeystrokeEvent;
use keypace::session::result::{CompletedTest, ContentStyle, TestMode, TestResult};
use keypace::store::schema::HistoryData;

const SEED: u64 = 0x6b70_6163_65;
const USER_ID: &str = "sample";
const TEST_COUNT: usize = 40;
const WORDS_PER_TEST: usize = 25;

const VOCABULARY: &[&str] = &[
    "the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog", "while", "their", "there",
    "which", "would", "through", "thought", "between", "because", "another", "should", "people",
    "world", "without", "question", "together", "typing", "keyboard", "rhythm", "quietly",
];

/// Keys this typist reaches for instead of the right one.
const HABITUAL_SLIPS: &[(char, char)] = &[('e', 'r'), ('h', 'j'), ('o', 'i'), ('t', 'r')];

// ── Helpers ──────────────────────────────────────────────────────────────

/// Typing speed improves across the history: gaps shrink from ~220ms to ~140ms.
fn base_gap_ms(test_number: usize) -> f64 {
    220.0 - 80.0 * test_number as f64 / TEST_COUNT as f64
}

/// Simulate one test. Slips get rarer over time, and "th" stays slow.
fn simulate(rng: &mut SmallRng, test_number: usize, created_at: DateTime<Utc>) -> TestResult {
    let slip_chance = 0.08 - 0.05 * test_number as f64 / TEST_COUNT as f64;
    let base_gap = base_gap_ms(test_number);

    let target_words: Vec<String> = (0..WORDS_PER_TEST)
        .map(|_| VOCABULARY[rng.gen_range(0..VOCABULARY.len())].to_string())
        .collect();

    let mut keystrokes = Vec::new();
    let mut typed_words = Vec::with_capacity(target_words.len());
    let mut clock = 0.0;
    let mut previous = None;

    for (word_index, word) in target_words.iter().enumerate() {
        let mut typed = String::new();
        for (char_index, expected) in word.chars().enumerate() {
            clock += base_gap + rng.gen_range(-30.0..30.0);
            if previous == Some('t') && expected == 'h' {
                clock += 120.0;
            }

            let slip = HABITUAL_SLIPS
                .iter()
                .find(|(from, _)| *from == expected)
                .filter(|_| rng.gen_bool(slip_chance))
                .map(|(_, to)| *to);

            match slip {
                Some(wrong) if rng.gen_bool(0.6) => {
                    keystrokes.push(KeystrokeEvent::typed(clock, wrong, expected, word_index, char_index));
                    clock += base_gap;
                    keystrokes.push(KeystrokeEvent::backspace(clock, word_index, char_index, expected));
                    clock += base_gap;
                    keystrokes.push(KeystrokeEvent::typed(clock, expected, expected, word_index, char_index));
                    typed.push(expected);
                }
                Some(wrong) => {
                    keystrokes.push(KeystrokeEvent::typed(clock, wrong, expected, word_index, char_index));
                    typed.push(wrong);
                }
                None => {
                    keystrokes.push(KeystrokeEvent::typed(clock, expected, expected, word_index, char_index));
                    typed.push(expected);
                }
            }
            previous = Some(expected);
        }
        if word_index + 1 < target_words.len() {
            clock += base_gap;
            keystrokes.push(KeystrokeEvent::typed(clock, ' ', ' ', word_index, word.chars().count()));
            previous = Some(' ');
        }
        typed_words.push(typed);
    }

    let content_style = match test_number % 5 {
        0 => ContentStyle::Quote,
        1 => ContentStyle::Code {
            language: "rust".to_string(),
        },
        2 if test_number % 10 == 2 => ContentStyle::TimeTrial {
            trial: (test_number / 10) as u32 + 1,
        },
        _ => ContentStyle::Prose,
    };

    TestResult::from_completed(CompletedTest {
        id: format!("sample-{test_number:03}"),
        user_id: USER_ID.to_string(),
        created_at,
        duration_secs: clock / 1000.0,
        test_content_id: None,
        content_style,
        mode: TestMode::Normal,
        target_words,
        typed_words,
        keystrokes,
        strict_mode_errors: 0,
    })
}

// ── Main ─────────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let mut rng = SmallRng::seed_from_u64(SEED);
    let Some(base) = Utc.with_ymd_and_hms(2026, 1, 5, 18, 0, 0).single() else {
        anyhow::bail!("invalid base timestamp");
    };

    let mut data = HistoryData::default();
    for test_number in 0..TEST_COUNT {
        let created_at = base + Duration::hours(test_number as i64 * 19);
        data.results.push(simulate(&mut rng, test_number, created_at));
    }
    // Newest first, the order the analytics expect.
    data.results.reverse();

    fs::create_dir_all("sample-history")?;
    let json = serde_json::to_string_pretty(&data)?;
    let path = "sample-history/history.json";
    fs::write(path, &json)?;
    println!("Wrote {path} ({} results, {} bytes)", data.results.len(), json.len());
    Ok(())
}
