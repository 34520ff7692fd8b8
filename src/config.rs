use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be at least 1")]
    ZeroWindow(&'static str),
    #[error("{name} must be a non-negative percentage, got {value}")]
    NegativeThreshold { name: &'static str, value: f64 },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Where history.json lives; unset means the platform data directory.
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub default_days: Option<u32>,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

fn default_user_id() -> String {
    "local".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            user_id: default_user_id(),
            default_days: None,
            analytics: AnalyticsConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            config.analytics.validate()?;
            Ok(config)
        } else {
            log::debug!("no config at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keypace")
            .join("config.toml")
    }
}

/// Window sizes and thresholds for the aggregate analytics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// How many of the newest tests form the "recent" window.
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
    /// Recent tests needed before a trend other than stable is reported.
    #[serde(default = "default_min_recent_tests")]
    pub min_recent_tests: usize,
    #[serde(default = "default_min_occurrences")]
    pub min_occurrences: usize,
    #[serde(default = "default_timing_trend_threshold_pct")]
    pub timing_trend_threshold_pct: f64,
    #[serde(default = "default_mistake_trend_threshold_pct")]
    pub mistake_trend_threshold_pct: f64,
    /// Per-test timings pooled by the slow-sequence ranking.
    #[serde(default = "default_slow_sequence_pool")]
    pub slow_sequence_pool: usize,
    /// Per-test timings pooled by the trend-aware sequence report.
    #[serde(default = "default_aggregate_timing_pool")]
    pub aggregate_timing_pool: usize,
    #[serde(default = "default_top_mistakes")]
    pub top_mistakes: usize,
    #[serde(default = "default_problematic_word_min_count")]
    pub problematic_word_min_count: usize,
}

fn default_recent_window() -> usize {
    10
}
fn default_min_recent_tests() -> usize {
    3
}
fn default_min_occurrences() -> usize {
    3
}
fn default_timing_trend_threshold_pct() -> f64 {
    10.0
}
fn default_mistake_trend_threshold_pct() -> f64 {
    25.0
}
fn default_slow_sequence_pool() -> usize {
    50
}
fn default_aggregate_timing_pool() -> usize {
    100
}
fn default_top_mistakes() -> usize {
    10
}
fn default_problematic_word_min_count() -> usize {
    1
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            recent_window: default_recent_window(),
            min_recent_tests: default_min_recent_tests(),
            min_occurrences: default_min_occurrences(),
            timing_trend_threshold_pct: default_timing_trend_threshold_pct(),
            mistake_trend_threshold_pct: default_mistake_trend_threshold_pct(),
            slow_sequence_pool: default_slow_sequence_pool(),
            aggregate_timing_pool: default_aggregate_timing_pool(),
            top_mistakes: default_top_mistakes(),
            problematic_word_min_count: default_problematic_word_min_count(),
        }
    }
}

impl AnalyticsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recent_window == 0 {
            return Err(ConfigError::ZeroWindow("recent_window"));
        }
        if self.slow_sequence_pool == 0 {
            return Err(ConfigError::ZeroWindow("slow_sequence_pool"));
        }
        if self.aggregate_timing_pool == 0 {
            return Err(ConfigError::ZeroWindow("aggregate_timing_pool"));
        }
        for (name, value) in [
            ("timing_trend_threshold_pct", self.timing_trend_threshold_pct),
            ("mistake_trend_threshold_pct", self.mistake_trend_threshold_pct),
        ] {
            if value < 0.0 || value.is_nan() {
                return Err(ConfigError::NegativeThreshold { name, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.user_id, "local");
        assert_eq!(config.default_days, None);
        assert_eq!(config.analytics, AnalyticsConfig::default());
        assert_eq!(config.data_dir, None);
    }

    #[test]
    fn test_partial_analytics_section_keeps_defaults() {
        let toml_str = r#"
user_id = "ada"
default_days = 30

[analytics]
problematic_word_min_count = 2
mistake_trend_threshold_pct = 20.0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.user_id, "ada");
        assert_eq!(config.default_days, Some(30));
        assert_eq!(config.analytics.problematic_word_min_count, 2);
        assert_eq!(config.analytics.mistake_trend_threshold_pct, 20.0);
        assert_eq!(config.analytics.recent_window, 10);
        assert_eq!(config.analytics.timing_trend_threshold_pct, 10.0);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.analytics, deserialized.analytics);
        assert_eq!(config.data_dir, deserialized.data_dir);
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let analytics = AnalyticsConfig {
            recent_window: 0,
            ..AnalyticsConfig::default()
        };
        assert_eq!(analytics.validate(), Err(ConfigError::ZeroWindow("recent_window")));
    }

    #[test]
    fn test_validate_rejects_negative_threshold() {
        let analytics = AnalyticsConfig {
            timing_trend_threshold_pct: -1.0,
            ..AnalyticsConfig::default()
        };
        assert!(matches!(
            analytics.validate(),
            Err(ConfigError::NegativeThreshold { name: "timing_trend_threshold_pct", .. })
        ));
    }

    #[test]
    fn test_load_from_missing_file_gives_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.analytics, AnalyticsConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.user_id = "grace".to_string();
        config.analytics.recent_window = 5;
        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.user_id, "grace");
        assert_eq!(loaded.analytics.recent_window, 5);
    }

    #[test]
    fn test_load_from_invalid_analytics_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[analytics]\nrecent_window = 0\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("recent_window"));
    }
}
