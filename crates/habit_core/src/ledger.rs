use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::date_key::{normalize, DateKey};

/// A value actually stored in the ledger.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Outcome {
    Completed,
    Missed,
}

/// What the ledger says about a day; `Unmarked` is the absence of an entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Mark {
    Completed,
    Missed,
    Unmarked,
}

impl Mark {
    pub fn as_outcome(self) -> Option<Outcome> {
        match self {
            Self::Completed => Some(Outcome::Completed),
            Self::Missed => Some(Outcome::Missed),
            Self::Unmarked => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Missed => "missed",
            Self::Unmarked => "unmarked",
        }
    }
}

impl From<Outcome> for Mark {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Completed => Self::Completed,
            Outcome::Missed => Self::Missed,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sparse per-habit record of completion outcomes keyed by local day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionLedger {
    entries: BTreeMap<DateKey, Outcome>,
}

impl CompletionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the wire form: either a mapping or a JSON string holding one.
    /// Anything malformed decodes to an empty ledger.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => {
                let mut ledger = Self::new();
                for (raw_key, raw_value) in map {
                    let key = normalize(raw_key.as_str());
                    if key.is_empty() {
                        tracing::debug!(key = %raw_key, "dropping completion with unparseable date");
                        continue;
                    }
                    if let Some(outcome) = decode_outcome(raw_value) {
                        ledger.entries.insert(key, outcome);
                    }
                }
                ledger
            }
            Value::String(raw) => Self::parse(raw),
            Value::Null => Self::new(),
            other => {
                tracing::warn!(value = %other, "completions are not a mapping; treating as empty");
                Self::new()
            }
        }
    }

    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::new();
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Object(_)) => Self::from_value(&value),
            Ok(_) => {
                tracing::warn!("completions string does not hold a mapping; treating as empty");
                Self::new()
            }
            Err(err) => {
                tracing::warn!(%err, "malformed completions string; treating as empty");
                Self::new()
            }
        }
    }

    pub fn get(&self, key: &DateKey) -> Mark {
        self.entries
            .get(key)
            .copied()
            .map(Mark::from)
            .unwrap_or(Mark::Unmarked)
    }

    pub fn get_date(&self, date: NaiveDate) -> Mark {
        self.get(&DateKey::from_date(date))
    }

    /// Record `mark` for `key`; `Unmarked` removes the entry. Empty keys are ignored.
    pub fn set(&mut self, key: &DateKey, mark: Mark) -> Mark {
        if key.is_empty() {
            return Mark::Unmarked;
        }
        let previous = match mark.as_outcome() {
            Some(outcome) => self.entries.insert(key.clone(), outcome),
            None => self.entries.remove(key),
        };
        previous.map(Mark::from).unwrap_or(Mark::Unmarked)
    }

    pub fn with_mark(mut self, key: &DateKey, mark: Mark) -> Self {
        self.set(key, mark);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DateKey, Outcome)> {
        self.entries.iter().map(|(key, outcome)| (key, *outcome))
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.entries.values().filter(|value| **value == outcome).count()
    }

    /// Latest real calendar day holding `outcome`.
    pub fn latest(&self, outcome: Outcome) -> Option<NaiveDate> {
        self.entries
            .iter()
            .rev()
            .filter(|(_, value)| **value == outcome)
            .find_map(|(key, _)| key.date())
    }

    /// Wire form: `true` for completed, `false` for missed.
    pub fn to_completions(&self) -> BTreeMap<String, bool> {
        self.entries
            .iter()
            .map(|(key, outcome)| (key.to_string(), *outcome == Outcome::Completed))
            .collect()
    }
}

impl FromIterator<(DateKey, Outcome)> for CompletionLedger {
    fn from_iter<I: IntoIterator<Item = (DateKey, Outcome)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .filter(|(key, _)| !key.is_empty())
                .collect(),
        }
    }
}

fn decode_outcome(value: &Value) -> Option<Outcome> {
    match value {
        Value::Bool(true) => Some(Outcome::Completed),
        Value::Bool(false) => Some(Outcome::Missed),
        Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Some(Outcome::Completed),
        Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Some(Outcome::Missed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(raw: &str) -> DateKey {
        normalize(raw)
    }

    #[test]
    fn decodes_native_mapping_and_string_encodings() {
        let native = CompletionLedger::from_value(&json!({
            "2024-01-01": true,
            "2024-01-02": "true",
            "2024-01-03": false,
            "2024-01-04": null,
        }));
        assert_eq!(native.get(&key("2024-01-01")), Mark::Completed);
        assert_eq!(native.get(&key("2024-01-02")), Mark::Completed);
        assert_eq!(native.get(&key("2024-01-03")), Mark::Missed);
        assert_eq!(native.get(&key("2024-01-04")), Mark::Unmarked);
        assert_eq!(native.len(), 3);

        let encoded = CompletionLedger::from_value(&json!(
            r#"{"2024-01-01":true,"2024-01-02":"true","2024-01-03":false}"#
        ));
        assert_eq!(encoded, native);
    }

    #[test]
    fn malformed_input_is_an_empty_ledger() {
        assert!(CompletionLedger::parse("{not json").is_empty());
        assert!(CompletionLedger::parse("[1,2,3]").is_empty());
        assert!(CompletionLedger::from_value(&json!(42)).is_empty());
        assert!(CompletionLedger::from_value(&json!({"someday": true})).is_empty());
    }

    #[test]
    fn setting_unmarked_deletes_the_entry() {
        let day = key("2024-01-05");
        let mut ledger = CompletionLedger::new();
        assert_eq!(ledger.set(&day, Mark::Completed), Mark::Unmarked);
        assert_eq!(ledger.set(&day, Mark::Missed), Mark::Completed);
        assert_eq!(ledger.set(&day, Mark::Unmarked), Mark::Missed);
        assert!(ledger.is_empty());
        assert!(!ledger.to_completions().contains_key("2024-01-05"));
    }

    #[test]
    fn empty_keys_are_never_stored() {
        let mut ledger = CompletionLedger::new();
        ledger.set(&DateKey::empty(), Mark::Completed);
        assert!(ledger.is_empty());
        assert_eq!(ledger.get(&DateKey::empty()), Mark::Unmarked);
    }

    #[test]
    fn latest_skips_keys_that_are_not_real_days() {
        let ledger = CompletionLedger::from_value(&json!({
            "2024-01-03": true,
            "2024-01-08": true,
            "2024-13-45": true,
            "2024-01-09": false,
        }));
        assert_eq!(
            ledger.latest(Outcome::Completed),
            NaiveDate::from_ymd_opt(2024, 1, 8)
        );
        assert_eq!(ledger.count(Outcome::Completed), 3);
        assert_eq!(ledger.count(Outcome::Missed), 1);
    }

    #[test]
    fn wire_form_uses_booleans() {
        let ledger = CompletionLedger::new()
            .with_mark(&key("2024-01-01"), Mark::Completed)
            .with_mark(&key("2024-01-02"), Mark::Missed);
        let wire = ledger.to_completions();
        assert_eq!(wire.get("2024-01-01"), Some(&true));
        assert_eq!(wire.get("2024-01-02"), Some(&false));
    }
}
