use chrono::NaiveDate;

use crate::classify::{classify, DayState, DayStatus};
use crate::date_key::DateKey;
use crate::ledger::{CompletionLedger, Mark};
use crate::schedule::HabitSchedule;

/// Ledger value a click on a day cell should write.
///
/// Unmarked days move to completed. A completed day steps back to missed when
/// the recurrence rule schedules it and is cleared otherwise. On today's cell a
/// completed day is always cleared so it falls back to its base classification.
pub fn next_mark(state: DayState, is_scheduled: bool) -> Mark {
    if state.today {
        return if state.is_completed() {
            Mark::Unmarked
        } else {
            Mark::Completed
        };
    }
    match state.status {
        DayStatus::Completed if is_scheduled => Mark::Missed,
        DayStatus::Completed => Mark::Unmarked,
        DayStatus::Missed | DayStatus::Planned | DayStatus::NotScheduled => Mark::Completed,
        _ => Mark::Completed,
    }
}

/// Classify `date` and, when the cell accepts a click, return the value to write.
///
/// The scheduled flag comes from the recurrence rule alone: a completion on
/// record always makes a day due, which would hide the clear-on-unscheduled path.
pub fn plan_toggle(
    schedule: &HabitSchedule,
    ledger: &CompletionLedger,
    date: NaiveDate,
    today: NaiveDate,
    epoch: NaiveDate,
) -> Option<(DayState, Mark)> {
    let state = classify(schedule, ledger, date, today, epoch);
    if !state.is_interactive() {
        return None;
    }
    let scheduled = schedule.is_scheduled(date, &DateKey::from_date(date));
    Some((state, next_mark(state, scheduled)))
}
