use std::collections::BTreeSet;
use std::fmt;

use chrono::{Datelike, Locale, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::date_key::{normalize, DateKey};
use crate::ledger::{CompletionLedger, Mark};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    #[default]
    Custom,
}

impl Frequency {
    /// Case-insensitive; anything unrecognised is treated as a custom schedule.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Self::Daily,
            "weekly" => Self::Weekly,
            "monthly" => Self::Monthly,
            _ => Self::Custom,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weekday identifiers as configured upstream, lower-cased once on the way in.
///
/// Entries may be weekday names in any locale, abbreviations, or numbers in
/// either Sunday-based (`0..=6`) or Monday-based (`1..=7`) numbering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedDays(BTreeSet<String>);

impl SelectedDays {
    pub fn new<I, S>(days: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            days.into_iter()
                .map(|day| day.as_ref().trim().to_lowercase())
                .filter(|day| !day.is_empty())
                .collect(),
        )
    }

    /// Accepts a JSON-encoded array or a comma-separated list.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(value @ Value::Array(_)) => Self::from_value(&value),
            _ => Self::new(trimmed.split(',')),
        }
    }

    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) => Self::new(items.iter().filter_map(scalar_token)),
            Value::String(raw) => Self::parse(raw),
            Value::Number(number) => Self::new([number.to_string()]),
            Value::Null => Self::default(),
            other => {
                tracing::warn!(value = %other, "ignoring unsupported selected-days encoding");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains_any<S: AsRef<str>>(&self, tokens: &[S]) -> bool {
        tokens.iter().any(|token| self.0.contains(token.as_ref()))
    }
}

fn scalar_token(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Recurrence configuration of one habit. Immutable once built.
#[derive(Debug, Clone)]
pub struct HabitSchedule {
    pub frequency: Frequency,
    pub selected_days: SelectedDays,
    pub specific_dates: BTreeSet<DateKey>,
    pub always_show: bool,
    /// Locale whose weekday names are accepted in `selected_days`.
    pub locale: Locale,
}

impl Default for HabitSchedule {
    fn default() -> Self {
        Self {
            frequency: Frequency::default(),
            selected_days: SelectedDays::default(),
            specific_dates: BTreeSet::new(),
            always_show: false,
            locale: Locale::en_US,
        }
    }
}

impl HabitSchedule {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            ..Self::default()
        }
    }

    pub fn daily() -> Self {
        Self::new(Frequency::Daily)
    }

    pub fn with_selected_days(mut self, days: SelectedDays) -> Self {
        self.selected_days = days;
        self
    }

    pub fn with_specific_dates<I, T>(mut self, dates: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        self.specific_dates = dates
            .into_iter()
            .map(|date| normalize(date.as_ref()))
            .filter(|key| !key.is_empty())
            .collect();
        self
    }

    pub fn with_always_show(mut self, always_show: bool) -> Self {
        self.always_show = always_show;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Whether the day-of-week of `date` appears in `selected_days` under any
    /// of its accepted spellings.
    pub fn matches_weekday(&self, date: NaiveDate) -> bool {
        if self.selected_days.is_empty() {
            return false;
        }
        self.selected_days
            .contains_any(&weekday_tokens(date, self.locale))
    }

    pub fn has_specific_date(&self, key: &DateKey) -> bool {
        !key.is_empty() && self.specific_dates.contains(key)
    }

    /// The recurrence rule alone, without regard to what the ledger recorded.
    pub fn is_scheduled(&self, date: NaiveDate, key: &DateKey) -> bool {
        self.always_show
            || self.frequency == Frequency::Daily
            || self.matches_weekday(date)
            || self.has_specific_date(key)
    }
}

/// The five lower-cased spellings a weekday may be configured with: Sunday-based
/// number, Monday-based number, English name, localized full and abbreviated name.
pub fn weekday_tokens(date: NaiveDate, locale: Locale) -> [String; 5] {
    let weekday = date.weekday();
    let midday = date
        .and_hms_opt(12, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive));
    let (full, short) = match midday {
        Some(dt) => (
            dt.format_localized("%A", locale).to_string().to_lowercase(),
            dt.format_localized("%a", locale).to_string().to_lowercase(),
        ),
        None => (String::new(), String::new()),
    };
    [
        weekday.num_days_from_sunday().to_string(),
        weekday.number_from_monday().to_string(),
        date.format("%A").to_string().to_lowercase(),
        full,
        short,
    ]
}

/// Whether the habit counts as due on `date`. First matching rule wins:
/// `always_show`, an explicit completion already on record, a daily
/// frequency, a weekday match, then the specific-date list.
pub fn is_due(
    schedule: &HabitSchedule,
    date: NaiveDate,
    key: &DateKey,
    ledger: &CompletionLedger,
) -> bool {
    if schedule.always_show {
        return true;
    }
    if !key.is_empty() && ledger.get(key) == Mark::Completed {
        return true;
    }
    if schedule.frequency == Frequency::Daily {
        return true;
    }
    if schedule.matches_weekday(date) {
        return true;
    }
    schedule.has_specific_date(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn due(schedule: &HabitSchedule, day: NaiveDate) -> bool {
        is_due(schedule, day, &DateKey::from_date(day), &CompletionLedger::default())
    }

    #[test]
    fn daily_is_due_regardless_of_selected_days() {
        let schedule =
            HabitSchedule::daily().with_selected_days(SelectedDays::new(["saturday"]));
        for offset in 0..14 {
            let day = date(2024, 1, 1) + chrono::Duration::days(offset);
            assert!(due(&schedule, day), "{day} should be due");
        }
    }

    #[test]
    fn weekday_matches_any_spelling() {
        // 2024-01-07 is a Sunday, 2024-01-08 a Monday.
        let sunday = date(2024, 1, 7);
        let monday = date(2024, 1, 8);
        let cases: &[(&str, NaiveDate)] = &[
            ("0", sunday),
            ("7", sunday),
            ("1", monday),
            ("Monday", monday),
            ("MON", monday),
            ("sunday", sunday),
        ];
        for (token, day) in cases {
            let schedule = HabitSchedule::new(Frequency::Weekly)
                .with_selected_days(SelectedDays::new([*token]));
            assert!(due(&schedule, *day), "token {token} should match {day}");
        }
        let tuesday_only = HabitSchedule::new(Frequency::Weekly)
            .with_selected_days(SelectedDays::new(["tuesday"]));
        assert!(!due(&tuesday_only, monday));
    }

    #[test]
    fn localized_names_follow_the_schedule_locale() {
        let monday = date(2024, 1, 8);
        let german = HabitSchedule::new(Frequency::Custom)
            .with_selected_days(SelectedDays::new(["Montag"]))
            .with_locale(Locale::de_DE);
        assert!(due(&german, monday));
        let english = german.clone().with_locale(Locale::en_US);
        assert!(!due(&english, monday));
    }

    #[test]
    fn selected_days_accept_every_upstream_encoding() {
        let expected = SelectedDays::new(["monday", "wednesday"]);
        assert_eq!(SelectedDays::parse(r#"["Monday","Wednesday"]"#), expected);
        assert_eq!(SelectedDays::parse("Monday, Wednesday"), expected);
        assert_eq!(
            SelectedDays::from_value(&serde_json::json!(["MONDAY", "wednesday"])),
            expected
        );
        assert_eq!(
            SelectedDays::from_value(&serde_json::json!([1, 3])),
            SelectedDays::new(["1", "3"])
        );
        assert!(SelectedDays::parse("").is_empty());
    }

    #[test]
    fn broken_json_falls_back_to_comma_split_then_no_match() {
        let days = SelectedDays::parse("[monday, tuesday");
        assert_eq!(days.len(), 2);
        let schedule = HabitSchedule::new(Frequency::Custom).with_selected_days(days);
        assert!(!due(&schedule, date(2024, 1, 8)));
        assert!(due(&schedule, date(2024, 1, 9)));
    }

    #[test]
    fn precedence_covers_always_show_completion_and_specific_dates() {
        let day = date(2024, 1, 10);
        let key = DateKey::from_date(day);
        let bare = HabitSchedule::new(Frequency::Custom);
        assert!(!due(&bare, day));

        assert!(due(&bare.clone().with_always_show(true), day));
        assert!(due(&bare.clone().with_specific_dates(["2024-01-10"]), day));

        let mut ledger = CompletionLedger::default();
        ledger.set(&key, Mark::Completed);
        assert!(is_due(&bare, day, &key, &ledger));
        assert!(!bare.is_scheduled(day, &key));

        ledger.set(&key, Mark::Missed);
        assert!(!is_due(&bare, day, &key, &ledger));
    }

    #[test]
    fn empty_key_never_matches_specific_dates() {
        let schedule = HabitSchedule::new(Frequency::Custom).with_specific_dates(["garbage"]);
        assert!(schedule.specific_dates.is_empty());
        assert!(!schedule.has_specific_date(&DateKey::empty()));
    }

    #[test]
    fn frequency_parsing_is_lenient() {
        assert_eq!(Frequency::parse("DAILY"), Frequency::Daily);
        assert_eq!(Frequency::parse(" weekly "), Frequency::Weekly);
        assert_eq!(Frequency::parse("fortnightly"), Frequency::Custom);
    }
}
