use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::metrics::{AccuracyMode, calculate_accuracy, calculate_wpm};
use crate::session::input::KeystrokeEvent;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    #[default]
    Complete,
    Deleted,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestMode {
    #[default]
    Normal,
    Speed,
    /// Wrong keys are rejected at entry.
    Strict,
}

/// Where the text for a test came from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentStyle {
    #[default]
    Prose,
    AiProse,
    Quote,
    Code {
        language: String,
    },
    /// Numbered fixed-text challenge, always scored strictly.
    TimeTrial {
        trial: u32,
    },
    Custom,
}

impl ContentStyle {
    pub fn label(&self) -> String {
        match self {
            ContentStyle::Prose => "prose".to_string(),
            ContentStyle::AiProse => "ai prose".to_string(),
            ContentStyle::Quote => "quote".to_string(),
            ContentStyle::Code { language } => format!("code ({language})"),
            ContentStyle::TimeTrial { trial } => format!("time trial {trial:03}"),
            ContentStyle::Custom => "custom".to_string(),
        }
    }
}

/// Raw capture of a finished test, before any metrics are derived.
#[derive(Clone, Debug)]
pub struct CompletedTest {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub test_content_id: Option<String>,
    pub content_style: ContentStyle,
    pub mode: TestMode,
    pub target_words: Vec<String>,
    pub typed_words: Vec<String>,
    pub keystrokes: Vec<KeystrokeEvent>,
    /// Keys rejected at entry; only meaningful when scored strictly.
    pub strict_mode_errors: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestResult {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    /// Seconds.
    pub duration: f64,
    #[serde(default)]
    pub test_content_id: Option<String>,
    #[serde(default)]
    pub content_style: ContentStyle,
    #[serde(default)]
    pub mode: TestMode,
    #[serde(default)]
    pub target_words: Vec<String>,
    #[serde(default)]
    pub typed_words: Vec<String>,
    pub wpm: u32,
    pub accuracy: f64,
    #[serde(default)]
    pub per_character_accuracy: Option<f64>,
    #[serde(default)]
    pub correct_word_count: usize,
    #[serde(default)]
    pub incorrect_word_count: usize,
    #[serde(default)]
    pub total_words: usize,
    #[serde(default)]
    pub total_typed_words: usize,
    #[serde(default)]
    pub strict_mode_errors: usize,
    /// May be a sampled subset of what was typed.
    #[serde(default)]
    pub keystroke_timings: Vec<KeystrokeEvent>,
    #[serde(default)]
    pub status: TestStatus,
}

impl TestResult {
    pub fn from_completed(test: CompletedTest) -> Self {
        let mode = accuracy_mode(test.mode, &test.content_style, test.strict_mode_errors);
        let wpm = calculate_wpm(&test.target_words, &test.typed_words, test.duration_secs);
        let accuracy = calculate_accuracy(&test.target_words, &test.typed_words, mode);

        Self {
            id: test.id,
            user_id: test.user_id,
            created_at: test.created_at,
            duration: test.duration_secs,
            test_content_id: test.test_content_id,
            content_style: test.content_style,
            mode: test.mode,
            wpm,
            accuracy: accuracy.accuracy,
            per_character_accuracy: Some(accuracy.per_character_accuracy),
            correct_word_count: accuracy.correct_count,
            incorrect_word_count: accuracy.incorrect_count,
            total_words: test.target_words.len(),
            total_typed_words: accuracy.total_typed,
            strict_mode_errors: test.strict_mode_errors,
            target_words: test.target_words,
            typed_words: test.typed_words,
            keystroke_timings: test.keystrokes,
            status: TestStatus::Complete,
        }
    }

    pub fn accuracy_mode(&self) -> AccuracyMode {
        accuracy_mode(self.mode, &self.content_style, self.strict_mode_errors)
    }

    /// Whether `accuracy` holds an error rate rather than a hit rate.
    pub fn is_error_rate(&self) -> bool {
        matches!(self.accuracy_mode(), AccuracyMode::Strict { .. })
    }

    pub fn is_active(&self) -> bool {
        self.status == TestStatus::Complete
    }

    pub fn soft_delete(&mut self) {
        self.status = TestStatus::Deleted;
    }

    pub fn restore(&mut self) {
        self.status = TestStatus::Complete;
    }
}

fn accuracy_mode(mode: TestMode, style: &ContentStyle, errors: usize) -> AccuracyMode {
    let strict = match (mode, style) {
        (TestMode::Strict, _) | (_, ContentStyle::TimeTrial { .. }) => true,
        (TestMode::Normal | TestMode::Speed, _) => false,
    };
    if strict {
        AccuracyMode::Strict { errors }
    } else {
        AccuracyMode::Normal
    }
}
