use chrono::{Locale, NaiveDate};
use tracing::warn;

use crate::date_key::{local_date, ToDateKey};

/// Engine-wide settings shared by every habit of an account.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Epoch used when the account record carries no usable creation date.
    pub default_epoch: NaiveDate,
    /// Locale whose weekday names are accepted in selected-day lists.
    pub locale: Locale,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("HABIT_DEFAULT_EPOCH") {
            match local_date(raw.trim()) {
                Some(date) => config.default_epoch = date,
                None => warn!(value = %raw, "ignoring unparseable HABIT_DEFAULT_EPOCH"),
            }
        }
        if let Ok(raw) = std::env::var("HABIT_LOCALE") {
            match parse_locale(&raw) {
                Some(locale) => config.locale = locale,
                None => warn!(value = %raw, "ignoring unknown HABIT_LOCALE"),
            }
        }
        config
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_default_epoch(mut self, epoch: NaiveDate) -> Self {
        self.default_epoch = epoch;
        self
    }

    /// The account epoch, or the configured fallback when it is absent or malformed.
    pub fn resolve_epoch<T: ToDateKey + ?Sized>(&self, value: Option<&T>) -> NaiveDate {
        value
            .and_then(|raw| local_date(raw))
            .unwrap_or(self.default_epoch)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_epoch: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN),
            locale: Locale::en_US,
        }
    }
}

/// Accepts POSIX (`de_DE`) and BCP 47 (`de-DE`) spellings.
pub fn parse_locale(name: &str) -> Option<Locale> {
    let normalized = name.trim().replace('-', "_");
    let normalized = normalized.split('.').next().unwrap_or_default();
    Locale::try_from(normalized).ok()
}
