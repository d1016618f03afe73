use chrono::NaiveDate;

use crate::classify::{classify, DayState};
use crate::date_key::DateKey;
use crate::ledger::{CompletionLedger, Mark};
use crate::schedule::{is_due, HabitSchedule};
use crate::streak::{summarize, HabitSummary};
use crate::toggle::plan_toggle;

/// A habit's recurrence rule together with its completion history.
#[derive(Debug, Clone, Default)]
pub struct Habit {
    pub title: String,
    pub schedule: HabitSchedule,
    pub ledger: CompletionLedger,
}

impl Habit {
    pub fn new(schedule: HabitSchedule, ledger: CompletionLedger) -> Self {
        Self {
            title: String::new(),
            schedule,
            ledger,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn is_due(&self, date: NaiveDate) -> bool {
        is_due(
            &self.schedule,
            date,
            &DateKey::from_date(date),
            &self.ledger,
        )
    }

    pub fn mark(&self, date: NaiveDate) -> Mark {
        self.ledger.get_date(date)
    }

    pub fn classify(&self, date: NaiveDate, today: NaiveDate, epoch: NaiveDate) -> DayState {
        classify(&self.schedule, &self.ledger, date, today, epoch)
    }

    /// The value a click on `date` would write, or `None` for a non-interactive cell.
    pub fn next_mark(&self, date: NaiveDate, today: NaiveDate, epoch: NaiveDate) -> Option<Mark> {
        plan_toggle(&self.schedule, &self.ledger, date, today, epoch).map(|(_, mark)| mark)
    }

    /// Apply a click locally, returning the written value. The ledger is
    /// replaced wholesale rather than edited in place.
    pub fn toggle(&mut self, date: NaiveDate, today: NaiveDate, epoch: NaiveDate) -> Option<Mark> {
        let mark = self.next_mark(date, today, epoch)?;
        let ledger = std::mem::take(&mut self.ledger);
        self.ledger = ledger.with_mark(&DateKey::from_date(date), mark);
        Some(mark)
    }

    pub fn summary(&self, epoch: NaiveDate, today: NaiveDate) -> HabitSummary {
        summarize(&self.schedule, &self.ledger, epoch, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::DayStatus;
    use crate::schedule::{Frequency, SelectedDays};

    #[test]
    fn toggling_unscheduled_completion_clears_it() {
        let schedule = HabitSchedule::new(Frequency::Weekly)
            .with_selected_days(SelectedDays::new(["monday"]));
        let mut habit = Habit::new(schedule, CompletionLedger::new()).with_title("Stretch");
        let epoch = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        assert_eq!(habit.toggle(tuesday, today, epoch), Some(Mark::Completed));
        assert!(habit.is_due(tuesday));
        assert_eq!(habit.toggle(tuesday, today, epoch), Some(Mark::Unmarked));
        assert_eq!(
            habit.classify(tuesday, today, epoch).status,
            DayStatus::NotScheduled
        );
        assert!(habit.ledger.is_empty());
    }
}
