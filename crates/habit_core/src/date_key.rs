use std::fmt;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::Serialize;

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%a %b %d %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M",
];

/// Canonical `YYYY-MM-DD` key for one local calendar day.
///
/// An empty key is produced for unparseable input and never matches another
/// key, including another empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DateKey(String);

impl DateKey {
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            date.month(),
            date.day()
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The calendar day this key names. Keys taken verbatim from upstream
    /// strings may not name a real day (`2024-13-45`), in which case this is `None`.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0, "%Y-%m-%d").ok()
    }

    pub fn matches(&self, other: &DateKey) -> bool {
        !self.is_empty() && self == other
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

/// Anything that can name a local calendar day.
pub trait ToDateKey {
    fn to_date_key(&self) -> DateKey;
}

impl ToDateKey for NaiveDate {
    fn to_date_key(&self) -> DateKey {
        DateKey::from_date(*self)
    }
}

/// Naive date-times are wall-clock values, so their own date is the local day.
impl ToDateKey for NaiveDateTime {
    fn to_date_key(&self) -> DateKey {
        DateKey::from_date(self.date())
    }
}

impl<Tz: TimeZone> ToDateKey for DateTime<Tz> {
    fn to_date_key(&self) -> DateKey {
        DateKey::from_date(self.with_timezone(&Local).date_naive())
    }
}

impl ToDateKey for DateKey {
    fn to_date_key(&self) -> DateKey {
        self.clone()
    }
}

impl ToDateKey for str {
    fn to_date_key(&self) -> DateKey {
        normalize_str(self)
    }
}

impl ToDateKey for String {
    fn to_date_key(&self) -> DateKey {
        normalize_str(self)
    }
}

impl<T: ToDateKey + ?Sized> ToDateKey for &T {
    fn to_date_key(&self) -> DateKey {
        (**self).to_date_key()
    }
}

impl<T: ToDateKey> ToDateKey for Option<T> {
    fn to_date_key(&self) -> DateKey {
        match self {
            Some(value) => value.to_date_key(),
            None => DateKey::empty(),
        }
    }
}

/// Normalise any date representation into its local calendar-day key.
pub fn normalize<T: ToDateKey + ?Sized>(value: &T) -> DateKey {
    value.to_date_key()
}

/// Normalise and resolve to a real calendar day in one step.
pub fn local_date<T: ToDateKey + ?Sized>(value: &T) -> Option<NaiveDate> {
    normalize(value).date()
}

fn normalize_str(raw: &str) -> DateKey {
    if let Some(prefix) = verbatim_key(raw) {
        return DateKey(prefix.to_string());
    }
    match parse_loose(raw.trim()) {
        Some(date) => DateKey::from_date(date),
        None => {
            tracing::debug!(input = raw, "unparseable date input");
            DateKey::empty()
        }
    }
}

/// Strings already shaped like `YYYY-MM-DD...` keep their first ten characters
/// untouched; re-parsing them could shift the day through a UTC offset.
fn verbatim_key(raw: &str) -> Option<&str> {
    let bytes = raw.as_bytes();
    if bytes.len() < 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    raw.get(..10)
}

fn parse_loose(value: &str) -> Option<NaiveDate> {
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Local).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Local).date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}
