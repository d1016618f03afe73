use chrono::NaiveDate;
use thiserror::Error;

use crate::classify::DayState;

#[derive(Debug, Error)]
pub enum HabitError {
    #[error("habit record is not valid JSON: {0}")]
    InvalidRecord(#[from] serde_json::Error),
    #[error("unknown habit `{0}`")]
    UnknownHabit(String),
    #[error("{date} cannot be toggled ({state})")]
    NotInteractive { date: NaiveDate, state: DayState },
    #[error("completion store failed: {0}")]
    Store(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, HabitError>;
