use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::ledger::{CompletionLedger, Mark, Outcome};
use crate::schedule::HabitSchedule;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HabitSummary {
    pub total_completed: u32,
    pub total_missed: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Days from `start` through `end`, inclusive. Empty when `start > end`.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(start), |day| day.succ_opt()).take_while(move |day| *day <= end)
}

/// Summarise a habit's history between the account epoch and `today`.
///
/// Unmarked days are transparent to streaks: they neither extend nor break
/// them. Only an explicit miss breaks a run.
pub fn summarize(
    schedule: &HabitSchedule,
    ledger: &CompletionLedger,
    epoch: NaiveDate,
    today: NaiveDate,
) -> HabitSummary {
    let total_completed = to_u32(ledger.count(Outcome::Completed));
    let total_missed = to_u32(ledger.count(Outcome::Missed))
        .saturating_add(implicit_misses(schedule, ledger, epoch, today));

    HabitSummary {
        total_completed,
        total_missed,
        current_streak: current_streak(ledger, epoch),
        longest_streak: longest_streak(ledger, epoch, today),
    }
}

/// Unmarked past days whose weekday is listed in `selected_days`.
///
/// Only the weekday list is consulted; `always_show`, daily frequency and
/// specific dates do not create implicit misses.
pub fn implicit_misses(
    schedule: &HabitSchedule,
    ledger: &CompletionLedger,
    epoch: NaiveDate,
    today: NaiveDate,
) -> u32 {
    if schedule.selected_days.is_empty() {
        return 0;
    }
    let mut by_weekday: [Option<bool>; 7] = [None; 7];
    let mut count = 0u32;
    for day in days_between(epoch, today) {
        if ledger.get_date(day) != Mark::Unmarked {
            continue;
        }
        let slot = &mut by_weekday[day.weekday().num_days_from_monday() as usize];
        let listed = *slot.get_or_insert_with(|| schedule.matches_weekday(day));
        if listed {
            count = count.saturating_add(1);
        }
    }
    count
}

pub fn longest_streak(ledger: &CompletionLedger, epoch: NaiveDate, today: NaiveDate) -> u32 {
    let mut running = 0u32;
    let mut longest = 0u32;
    for day in days_between(epoch, today) {
        match ledger.get_date(day) {
            Mark::Completed => {
                running += 1;
                longest = longest.max(running);
            }
            Mark::Missed => running = 0,
            Mark::Unmarked => {}
        }
    }
    longest
}

/// Completions counted backwards from the latest completed day until the
/// first explicit miss or the epoch.
pub fn current_streak(ledger: &CompletionLedger, epoch: NaiveDate) -> u32 {
    let Some(latest) = ledger.latest(Outcome::Completed) else {
        return 0;
    };
    let mut streak = 0u32;
    let backwards =
        std::iter::successors(Some(latest), |day| day.pred_opt()).take_while(|day| *day >= epoch);
    for day in backwards {
        match ledger.get_date(day) {
            Mark::Completed => streak += 1,
            Mark::Missed => break,
            Mark::Unmarked => {}
        }
    }
    streak
}

fn to_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
