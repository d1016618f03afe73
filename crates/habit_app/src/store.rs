use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use habit_core::{CompletionLedger, CompletionStore, DateKey, HabitRecord, Mark};
use serde_json::Value;

/// Keeps a single habit record in a JSON file and rewrites its `completions`
/// mapping on every toggle.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifier derived from the file name, e.g. `gym` for `habits/gym.json`.
    pub fn habit_id(&self) -> String {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("habit")
            .to_string()
    }

    pub fn load_record(&self) -> Result<HabitRecord> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        let record = HabitRecord::from_json(&raw)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        Ok(record)
    }

    fn read_value(&self) -> Result<Value> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", self.path.display()))
    }

    fn write_value(&self, value: &Value) -> Result<()> {
        let mut payload = serde_json::to_string_pretty(value)?;
        payload.push('\n');
        fs::write(&self.path, payload)
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

impl CompletionStore for JsonFileStore {
    fn store(&self, _habit_id: &str, key: &DateKey, mark: Mark) -> Result<()> {
        let mut value = self.read_value()?;
        let object = value
            .as_object_mut()
            .context("habit file does not hold a JSON object")?;
        let mut ledger =
            CompletionLedger::from_value(object.get("completions").unwrap_or(&Value::Null));
        ledger.set(key, mark);
        object.insert(
            "completions".to_string(),
            serde_json::to_value(ledger.to_completions())?,
        );
        self.write_value(&value)
    }

    fn fetch(&self, _habit_id: &str) -> Result<CompletionLedger> {
        Ok(self.load_record()?.ledger())
    }
}
