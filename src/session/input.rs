use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BACKSPACE_NAME: &str = "Backspace";
pub const TAB_NAME: &str = "Tab";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognised key name {0:?}")]
pub struct KeyParseError(pub String);

/// A single key press as captured by the input layer.
///
/// Serialized as a one-character string, or as `"Backspace"` / `"Tab"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Key {
    Char(char),
    Backspace,
    Tab,
}

impl Key {
    /// True for character entries, including space. Named keys are excluded.
    pub fn is_single_char(&self) -> bool {
        matches!(self, Key::Char(_))
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Key::Char(ch) => Some(*ch),
            Key::Backspace | Key::Tab => None,
        }
    }
}

impl TryFrom<String> for Key {
    type Error = KeyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(Key::Char(ch)),
            _ if value == BACKSPACE_NAME => Ok(Key::Backspace),
            _ if value == TAB_NAME => Ok(Key::Tab),
            _ => Err(KeyParseError(value)),
        }
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(ch) => write!(f, "{ch}"),
            Key::Backspace => f.write_str(BACKSPACE_NAME),
            Key::Tab => f.write_str(TAB_NAME),
        }
    }
}

/// One recorded key press. Timestamps are milliseconds since the test started
/// and never decrease within a test.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeystrokeEvent {
    pub timestamp: f64,
    pub key: Key,
    pub word_index: usize,
    pub char_index: usize,
    pub expected_char: char,
    pub was_correct: bool,
    #[serde(default)]
    pub is_backspace: bool,
}

impl KeystrokeEvent {
    pub fn typed(
        timestamp: f64,
        ch: char,
        expected_char: char,
        word_index: usize,
        char_index: usize,
    ) -> Self {
        Self {
            timestamp,
            key: Key::Char(ch),
            word_index,
            char_index,
            expected_char,
            was_correct: ch == expected_char,
            is_backspace: false,
        }
    }

    pub fn backspace(timestamp: f64, word_index: usize, char_index: usize, expected_char: char) -> Self {
        Self {
            timestamp,
            key: Key::Backspace,
            word_index,
            char_index,
            expected_char,
            was_correct: false,
            is_backspace: true,
        }
    }

    /// Character entries that take part in n-gram windows.
    pub fn is_sequence_char(&self) -> bool {
        !self.is_backspace && self.key.is_single_char()
    }
}
