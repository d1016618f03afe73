use std::collections::HashMap;

use chrono::NaiveDate;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::calendar::{self, DayCell};
use crate::classify::DayState;
use crate::config::EngineConfig;
use crate::date_key::DateKey;
use crate::error::{HabitError, Result};
use crate::habit::Habit;
use crate::ledger::{CompletionLedger, Mark};
use crate::streak::HabitSummary;
use crate::toggle::plan_toggle;

/// Persistence collaborator. Implementations own storage and transport.
pub trait CompletionStore: Send + Sync {
    fn store(&self, habit_id: &str, key: &DateKey, mark: Mark) -> anyhow::Result<()>;
    fn fetch(&self, habit_id: &str) -> anyhow::Result<CompletionLedger>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    ledgers: RwLock<HashMap<String, CompletionLedger>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, habit_id: impl Into<String>, ledger: CompletionLedger) {
        self.ledgers.write().insert(habit_id.into(), ledger);
    }
}

impl CompletionStore for MemoryStore {
    fn store(&self, habit_id: &str, key: &DateKey, mark: Mark) -> anyhow::Result<()> {
        self.ledgers
            .write()
            .entry(habit_id.to_string())
            .or_default()
            .set(key, mark);
        Ok(())
    }

    fn fetch(&self, habit_id: &str) -> anyhow::Result<CompletionLedger> {
        Ok(self
            .ledgers
            .read()
            .get(habit_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Holds the habits of one account and routes clicks through the store.
pub struct HabitService {
    habits: RwLock<HashMap<String, Habit>>,
    epoch: NaiveDate,
    store: Box<dyn CompletionStore>,
}

pub struct HabitServiceBuilder {
    habits: Vec<(String, Habit)>,
    epoch: Option<NaiveDate>,
    config: EngineConfig,
    store: Option<Box<dyn CompletionStore>>,
}

impl HabitServiceBuilder {
    pub fn new() -> Self {
        Self {
            habits: Vec::new(),
            epoch: None,
            config: EngineConfig::default(),
            store: None,
        }
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn epoch(mut self, epoch: NaiveDate) -> Self {
        self.epoch = Some(epoch);
        self
    }

    pub fn add_habit(mut self, id: impl Into<String>, habit: Habit) -> Self {
        self.habits.push((id.into(), habit));
        self
    }

    pub fn with_store(mut self, store: Box<dyn CompletionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Without an explicit store the service keeps ledgers in memory, seeded
    /// from the habits it was built with.
    pub fn build(self) -> HabitService {
        let store = self.store.unwrap_or_else(|| {
            let memory = MemoryStore::new();
            for (id, habit) in &self.habits {
                memory.seed(id.clone(), habit.ledger.clone());
            }
            Box::new(memory) as Box<dyn CompletionStore>
        });
        HabitService {
            habits: RwLock::new(self.habits.into_iter().collect()),
            epoch: self.epoch.unwrap_or(self.config.default_epoch),
            store,
        }
    }
}

impl Default for HabitServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HabitService {
    pub fn builder() -> HabitServiceBuilder {
        HabitServiceBuilder::new()
    }

    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    pub fn habit_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.habits.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn habit(&self, id: &str) -> Result<Habit> {
        self.habits
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| HabitError::UnknownHabit(id.to_string()))
    }

    pub fn classify(&self, id: &str, date: NaiveDate, today: NaiveDate) -> Result<DayState> {
        Ok(self.habit(id)?.classify(date, today, self.epoch))
    }

    pub fn summary(&self, id: &str, today: NaiveDate) -> Result<HabitSummary> {
        Ok(self.habit(id)?.summary(self.epoch, today))
    }

    pub fn month_grid(
        &self,
        id: &str,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Result<Vec<DayCell>> {
        let habit = self.habit(id)?;
        Ok(calendar::month_grid(&habit, year, month, today, self.epoch))
    }

    /// Handle a click on `date`: compute the next value, persist it, then swap
    /// in the ledger as the store now reports it.
    pub fn toggle_day(&self, id: &str, date: NaiveDate, today: NaiveDate) -> Result<Mark> {
        let habit = self.habit(id)?;
        let Some((state, mark)) =
            plan_toggle(&habit.schedule, &habit.ledger, date, today, self.epoch)
        else {
            let state = habit.classify(date, today, self.epoch);
            return Err(HabitError::NotInteractive { date, state });
        };

        let key = DateKey::from_date(date);
        self.store
            .store(id, &key, mark)
            .map_err(HabitError::Store)?;
        info!(habit = %id, date = %key, from = %state, to = %mark, "toggled day");

        let refreshed = match self.store.fetch(id) {
            Ok(ledger) => ledger,
            Err(err) => {
                warn!(habit = %id, error = %err, "refetch failed; keeping the written value");
                habit.ledger.with_mark(&key, mark)
            }
        };
        if let Some(entry) = self.habits.write().get_mut(id) {
            entry.ledger = refreshed;
        }
        Ok(mark)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::DayStatus;
    use crate::schedule::{Frequency, HabitSchedule, SelectedDays};
    use anyhow::anyhow;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn weekly_monday() -> Habit {
        Habit::new(
            HabitSchedule::new(Frequency::Weekly).with_selected_days(SelectedDays::new(["monday"])),
            CompletionLedger::new(),
        )
    }

    struct FailingStore;

    impl CompletionStore for FailingStore {
        fn store(&self, _: &str, _: &DateKey, _: Mark) -> anyhow::Result<()> {
            Err(anyhow!("offline"))
        }

        fn fetch(&self, _: &str) -> anyhow::Result<CompletionLedger> {
            Err(anyhow!("offline"))
        }
    }

    #[test]
    fn toggle_persists_and_refreshes_the_ledger() {
        let service = HabitService::builder()
            .epoch(date(2024, 1, 1))
            .add_habit("stretch", weekly_monday())
            .build();
        let today = date(2024, 1, 10);
        let monday = date(2024, 1, 8);

        assert_eq!(service.toggle_day("stretch", monday, today).unwrap(), Mark::Completed);
        assert_eq!(
            service.classify("stretch", monday, today).unwrap().status,
            DayStatus::Completed
        );
        assert_eq!(service.toggle_day("stretch", monday, today).unwrap(), Mark::Missed);
        // The explicit miss plus Monday the 1st, which was never marked.
        assert_eq!(service.summary("stretch", today).unwrap().total_missed, 2);
    }

    #[test]
    fn non_interactive_and_unknown_habits_are_errors() {
        let service = HabitService::builder()
            .epoch(date(2024, 1, 1))
            .add_habit("stretch", weekly_monday())
            .build();
        let today = date(2024, 1, 10);
        assert!(matches!(
            service.toggle_day("stretch", date(2024, 1, 15), today),
            Err(HabitError::NotInteractive { .. })
        ));
        assert!(matches!(
            service.toggle_day("read", today, today),
            Err(HabitError::UnknownHabit(_))
        ));
    }

    #[test]
    fn store_failure_leaves_the_ledger_untouched() {
        let service = HabitService::builder()
            .epoch(date(2024, 1, 1))
            .add_habit("stretch", weekly_monday())
            .with_store(Box::new(FailingStore))
            .build();
        let today = date(2024, 1, 10);
        assert!(matches!(
            service.toggle_day("stretch", today, today),
            Err(HabitError::Store(_))
        ));
        assert!(service.habit("stretch").unwrap().ledger.is_empty());
    }

    #[test]
    fn missing_epoch_uses_the_configured_default() {
        let service = HabitService::builder()
            .config(EngineConfig::default().with_default_epoch(date(2023, 6, 1)))
            .build();
        assert_eq!(service.epoch(), date(2023, 6, 1));
        assert!(service.habit_ids().is_empty());
    }
}
