use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use crate::session::result::{TestResult, TestStatus};
use crate::store::schema::{HistoryData, SCHEMA_VERSION, StoredHistory};

const HISTORY_FILE: &str = "history.json";

pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keypace");
        Self::with_base_dir(base_dir)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// Read the history file as raw records. `None` means there is no file
    /// yet; a file that cannot be read, parsed, or has another schema version
    /// is an error.
    fn read_stored(&self) -> Result<Option<StoredHistory>> {
        let path = self.file_path(HISTORY_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let stored: StoredHistory =
            serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        if stored.needs_reset() {
            bail!(
                "{} has schema version {}, expected {SCHEMA_VERSION}",
                path.display(),
                stored.schema_version
            );
        }
        Ok(Some(stored))
    }

    /// Load the history for reading. A missing or unreadable file is an empty
    /// history; unreadable files and records that fail to decode are logged
    /// and skipped.
    pub fn load_history(&self) -> HistoryData {
        match self.read_stored() {
            Ok(Some(stored)) => stored.decode(),
            Ok(None) => HistoryData::default(),
            Err(e) => {
                log::warn!("could not load history: {e:#}");
                HistoryData::default()
            }
        }
    }

    pub fn save_history(&self, data: &HistoryData) -> Result<()> {
        self.write_atomic(&serde_json::to_string_pretty(data)?, data.results.len())
    }

    fn save_stored(&self, stored: &StoredHistory) -> Result<()> {
        self.write_atomic(&serde_json::to_string_pretty(stored)?, stored.results.len())
    }

    fn write_atomic(&self, json: &str, count: usize) -> Result<()> {
        let path = self.file_path(HISTORY_FILE);
        let tmp_path = path.with_extension("tmp");

        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        log::info!("saved {count} results to {}", path.display());
        Ok(())
    }

    /// Add one result. Fails without touching the file if the existing
    /// history cannot be read.
    pub fn append_result(&self, result: TestResult) -> Result<()> {
        let mut stored = self.read_stored()?.unwrap_or_default();
        if stored.position(&result.id).is_some() {
            bail!("a result with id {} already exists", result.id);
        }
        stored.results.push(serde_json::to_value(&result)?);
        self.save_stored(&stored)
    }

    /// Change the lifecycle status of one result. Returns false if no result
    /// has that id.
    pub fn set_status(&self, id: &str, status: TestStatus) -> Result<bool> {
        let Some(mut stored) = self.read_stored()? else {
            return Ok(false);
        };
        let Some(index) = stored.position(id) else {
            return Ok(false);
        };
        let mut result: TestResult = serde_json::from_value(stored.results[index].clone())
            .with_context(|| format!("decoding result {id}"))?;
        match status {
            TestStatus::Deleted => result.soft_delete(),
            TestStatus::Complete => result.restore(),
        }
        stored.results[index] = serde_json::to_value(&result)?;
        self.save_stored(&stored)?;
        Ok(true)
    }

    /// Non-deleted results for `user_id`, newest first.
    pub fn active_results(&self, user_id: &str) -> Vec<TestResult> {
        let mut results: Vec<TestResult> = self
            .load_history()
            .results
            .into_iter()
            .filter(|r| r.user_id == user_id && r.is_active())
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        results
    }
}
