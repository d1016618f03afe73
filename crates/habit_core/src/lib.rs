pub mod calendar;
pub mod classify;
pub mod config;
pub mod date_key;
pub mod error;
pub mod habit;
pub mod ledger;
pub mod record;
pub mod schedule;
pub mod service;
pub mod streak;
pub mod toggle;

pub use crate::classify::{classify, DayState, DayStatus};
pub use crate::config::EngineConfig;
pub use crate::date_key::{normalize, DateKey, ToDateKey};
pub use crate::error::HabitError;
pub use crate::habit::Habit;
pub use crate::ledger::{CompletionLedger, Mark, Outcome};
pub use crate::record::HabitRecord;
pub use crate::schedule::{is_due, Frequency, HabitSchedule, SelectedDays};
pub use crate::service::{CompletionStore, HabitService, HabitServiceBuilder, MemoryStore};
pub use crate::streak::{summarize, HabitSummary};
pub use crate::toggle::next_mark;
