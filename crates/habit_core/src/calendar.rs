use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::classify::DayState;
use crate::date_key::DateKey;
use crate::habit::Habit;
use crate::streak::days_between;

/// Everything a calendar grid needs to render and wire up one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub key: DateKey,
    pub state: DayState,
    pub scheduled: bool,
}

impl DayCell {
    pub fn is_interactive(&self) -> bool {
        self.state.is_interactive()
    }
}

pub fn range_cells(
    habit: &Habit,
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
    epoch: NaiveDate,
) -> Vec<DayCell> {
    days_between(start, end)
        .map(|date| DayCell {
            date,
            key: DateKey::from_date(date),
            state: habit.classify(date, today, epoch),
            scheduled: habit.is_due(date),
        })
        .collect()
}

/// One cell per day of `month`. An invalid year/month gives an empty grid.
pub fn month_grid(
    habit: &Habit,
    year: i32,
    month: u32,
    today: NaiveDate,
    epoch: NaiveDate,
) -> Vec<DayCell> {
    let Some((first, last)) = month_bounds(year, month) else {
        return Vec::new();
    };
    range_cells(habit, first, last, today, epoch)
}

pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    Some((first, last))
}

/// Lay cells out in Monday-first weeks, padding the edges with `None`.
pub fn weeks(cells: &[DayCell]) -> Vec<[Option<&DayCell>; 7]> {
    let mut rows: Vec<[Option<&DayCell>; 7]> = Vec::new();
    let mut row: [Option<&DayCell>; 7] = [None; 7];
    let mut dirty = false;
    for cell in cells {
        let column = cell.date.weekday().num_days_from_monday() as usize;
        if dirty && column == 0 {
            rows.push(row);
            row = [None; 7];
        }
        row[column] = Some(cell);
        dirty = true;
    }
    if dirty {
        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::DayStatus;
    use crate::ledger::CompletionLedger;
    use crate::schedule::{Frequency, HabitSchedule, SelectedDays};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_grid_covers_every_day() {
        let habit = Habit::new(HabitSchedule::daily(), CompletionLedger::new());
        let today = date(2024, 2, 15);
        let cells = month_grid(&habit, 2024, 2, today, date(2024, 2, 10));
        assert_eq!(cells.len(), 29);
        assert_eq!(cells[0].state.status, DayStatus::Inactive);
        assert_eq!(cells[14].state, DayState::on_today(DayStatus::Planned));
        assert_eq!(cells[20].state.status, DayStatus::PlannedFuture);
        assert!(!cells[20].is_interactive());
        assert!(month_grid(&habit, 2024, 13, today, today).is_empty());
    }

    #[test]
    fn weeks_start_on_monday() {
        let habit = Habit::new(
            HabitSchedule::new(Frequency::Weekly).with_selected_days(SelectedDays::new(["1"])),
            CompletionLedger::new(),
        );
        // January 2024 starts on a Monday and ends on a Wednesday.
        let cells = month_grid(&habit, 2024, 1, date(2024, 1, 31), date(2024, 1, 1));
        let rows = weeks(&cells);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0][0].map(|c| c.date), Some(date(2024, 1, 1)));
        assert!(rows[0][0].map(|c| c.scheduled).unwrap_or(false));
        assert_eq!(rows[4][2].map(|c| c.date), Some(date(2024, 1, 31)));
        assert!(rows[4][3].is_none());
    }

    #[test]
    fn december_bounds_roll_the_year() {
        assert_eq!(
            month_bounds(2024, 12),
            Some((date(2024, 12, 1), date(2024, 12, 31)))
        );
        assert_eq!(month_bounds(2024, 0), None);
    }
}
