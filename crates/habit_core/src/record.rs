use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::date_key::{normalize, DateKey};
use crate::error::Result;
use crate::habit::Habit;
use crate::ledger::CompletionLedger;
use crate::schedule::{Frequency, HabitSchedule, SelectedDays};

/// A habit as delivered by the upstream API.
///
/// Every field is kept loose on the way in so that one odd encoding never
/// rejects the whole record; [`HabitRecord::into_habit`] normalises them once.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HabitRecord {
    #[serde(alias = "name")]
    pub title: Value,
    pub frequency: Value,
    #[serde(rename = "selectedDays", alias = "selected_days")]
    pub selected_days: Value,
    #[serde(rename = "specificDates")]
    pub specific_dates: Value,
    #[serde(rename = "specific_dates")]
    pub specific_dates_alt: Value,
    #[serde(rename = "alwaysShow", alias = "always_show")]
    pub always_show: Value,
    pub completions: Value,
    #[serde(rename = "createdAt", alias = "accountCreatedAt")]
    pub created_at: Value,
}

impl HabitRecord {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn frequency(&self) -> Frequency {
        match &self.frequency {
            Value::String(raw) => Frequency::parse(raw),
            _ => Frequency::default(),
        }
    }

    pub fn always_show(&self) -> bool {
        match &self.always_show {
            Value::Bool(flag) => *flag,
            Value::String(raw) => raw.trim().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Union of both specific-date fields, normalised to keys.
    pub fn specific_dates(&self) -> BTreeSet<DateKey> {
        let mut keys = BTreeSet::new();
        for field in [&self.specific_dates, &self.specific_dates_alt] {
            for raw in string_list(field) {
                let key = normalize(raw.as_str());
                if !key.is_empty() {
                    keys.insert(key);
                }
            }
        }
        keys
    }

    pub fn ledger(&self) -> CompletionLedger {
        CompletionLedger::from_value(&self.completions)
    }

    pub fn schedule(&self, config: &EngineConfig) -> HabitSchedule {
        HabitSchedule {
            frequency: self.frequency(),
            selected_days: SelectedDays::from_value(&self.selected_days),
            specific_dates: self.specific_dates(),
            always_show: self.always_show(),
            locale: config.locale,
        }
    }

    /// Creation date carried on the record, falling back to the configured default.
    pub fn epoch(&self, config: &EngineConfig) -> NaiveDate {
        match &self.created_at {
            Value::String(raw) => config.resolve_epoch(Some(raw.as_str())),
            _ => config.default_epoch,
        }
    }

    pub fn into_habit(self, config: &EngineConfig) -> Habit {
        let schedule = self.schedule(config);
        let ledger = self.ledger();
        let title = match self.title {
            Value::String(title) => title,
            _ => String::new(),
        };
        tracing::debug!(
            %title,
            frequency = %schedule.frequency,
            selected = schedule.selected_days.len(),
            entries = ledger.len(),
            "normalised habit record"
        );
        Habit {
            title,
            schedule,
            ledger,
        }
    }
}

/// Flatten an array, a JSON-encoded array or a comma-separated string into entries.
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Value::String(raw) => match serde_json::from_str::<Value>(raw.trim()) {
            Ok(inner @ Value::Array(_)) => string_list(&inner),
            _ => raw
                .split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect(),
        },
        _ => Vec::new(),
    }
}
