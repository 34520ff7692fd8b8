use serde::{Deserialize, Serialize};

use crate::session::result::TestResult;

pub const SCHEMA_VERSION: u32 = 1;

/// On-disk test history. Results are kept in insertion order; readers sort.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryData {
    pub schema_version: u32,
    #[serde(default)]
    pub results: Vec<TestResult>,
}

impl Default for HistoryData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            results: Vec::new(),
        }
    }
}

/// The history file as written, with each record left as raw JSON. Writers
/// go through this so records that no longer decode are carried over intact.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredHistory {
    pub schema_version: u32,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

impl Default for StoredHistory {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            results: Vec::new(),
        }
    }
}

impl StoredHistory {
    /// Check if loaded data has a stale schema version.
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }

    /// Id of the record at `index`, if it has one.
    pub fn record_id(&self, index: usize) -> Option<&str> {
        self.results.get(index)?.get("id")?.as_str()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        (0..self.results.len()).find(|&i| self.record_id(i) == Some(id))
    }

    /// Decode every record, skipping the ones that fail with a warning.
    pub fn decode(self) -> HistoryData {
        let results = self
            .results
            .into_iter()
            .enumerate()
            .filter_map(|(i, value)| match serde_json::from_value::<TestResult>(value) {
                Ok(result) => Some(result),
                Err(e) => {
                    log::warn!("skipping history record {i}: {e}");
                    None
                }
            })
            .collect();
        HistoryData {
            schema_version: self.schema_version,
            results,
        }
    }
}
