use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::date_key::DateKey;
use crate::ledger::{CompletionLedger, Mark};
use crate::schedule::{is_due, HabitSchedule};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DayStatus {
    Completed,
    Missed,
    /// Scheduled, past or today, unmarked.
    Planned,
    /// Scheduled, in the future, unmarked.
    PlannedFuture,
    /// Not scheduled, past or today, unmarked.
    NotScheduled,
    /// Not scheduled, in the future, unmarked.
    NotScheduledFuture,
    /// Before the account existed.
    Inactive,
}

impl DayStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Missed => "missed",
            Self::Planned => "planned",
            Self::PlannedFuture => "planned-future",
            Self::NotScheduled => "not-scheduled",
            Self::NotScheduledFuture => "not-scheduled-future",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of one day cell. `today` overlays the base status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DayState {
    pub status: DayStatus,
    pub today: bool,
}

impl DayState {
    pub fn new(status: DayStatus) -> Self {
        Self {
            status,
            today: false,
        }
    }

    pub fn on_today(status: DayStatus) -> Self {
        Self {
            status,
            today: true,
        }
    }

    pub fn is_interactive(&self) -> bool {
        !matches!(
            self.status,
            DayStatus::Inactive | DayStatus::PlannedFuture | DayStatus::NotScheduledFuture
        )
    }

    pub fn is_completed(&self) -> bool {
        self.status == DayStatus::Completed
    }
}

impl fmt::Display for DayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.today {
            write!(f, "{} (today)", self.status)
        } else {
            write!(f, "{}", self.status)
        }
    }
}

/// Classify `date` for display and interaction.
///
/// Days before `epoch` are inactive. Otherwise an explicit ledger entry wins,
/// then today's overlay, then the schedule split by past and future.
pub fn classify(
    schedule: &HabitSchedule,
    ledger: &CompletionLedger,
    date: NaiveDate,
    today: NaiveDate,
    epoch: NaiveDate,
) -> DayState {
    if date < epoch {
        return DayState::new(DayStatus::Inactive);
    }

    let key = DateKey::from_date(date);
    let mark = ledger.get(&key);
    let scheduled = is_due(schedule, date, &key, ledger);
    let is_today = key.matches(&DateKey::from_date(today));
    let is_future = date > today;

    let status = match mark {
        Mark::Completed => DayStatus::Completed,
        Mark::Missed => DayStatus::Missed,
        Mark::Unmarked if is_today || !is_future => {
            if scheduled {
                DayStatus::Planned
            } else {
                DayStatus::NotScheduled
            }
        }
        Mark::Unmarked if scheduled => DayStatus::PlannedFuture,
        Mark::Unmarked => DayStatus::NotScheduledFuture,
    };

    DayState {
        status,
        today: is_today,
    }
}
